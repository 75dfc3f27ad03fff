/// Seed-phrase wallet backups
///
/// A backup is the JSON document the web wallet exports:
/// `{ source, seedPhrase[12], date, warning }`. The signing keypair is derived
/// from the phrase with an empty passphrase (PBKDF2 seed, first 32 bytes).
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::keypair::keypair_from_seed_phrase_and_passphrase;

use crate::errors::{FundsuError, FundsuResult, ValidationError};
use crate::logger::{self, LogTag};

pub const BACKUP_SOURCE: &str = "solana-wallet-app";
pub const SEED_PHRASE_WORDS: usize = 12;
pub const BACKUP_WARNING: &str =
    "Never share this file with anyone. Anyone with your seed phrase can access your funds.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBackup {
    pub source: String,
    pub seed_phrase: Vec<String>,
    /// ISO-8601
    pub date: String,
    pub warning: String,
}

/// Twelve lowercase alphabetic words
pub fn validate_seed_phrase(words: &[String]) -> Result<(), ValidationError> {
    if words.len() != SEED_PHRASE_WORDS {
        return Err(ValidationError::InvalidSeedPhrase {
            reason: format!("expected {} words, got {}", SEED_PHRASE_WORDS, words.len()),
        });
    }
    if let Some((index, _)) = words
        .iter()
        .enumerate()
        .find(|(_, w)| w.is_empty() || !w.chars().all(|c| c.is_ascii_lowercase()))
    {
        return Err(ValidationError::InvalidSeedPhrase {
            reason: format!("word {} is not a lowercase word", index + 1),
        });
    }
    Ok(())
}

/// Split user input into normalised words and validate them
pub fn parse_seed_phrase(text: &str) -> Result<Vec<String>, ValidationError> {
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_lowercase()).collect();
    validate_seed_phrase(&words)?;
    Ok(words)
}

impl WalletBackup {
    pub fn new(seed_phrase: Vec<String>, date: DateTime<Utc>) -> Result<Self, ValidationError> {
        validate_seed_phrase(&seed_phrase)?;
        Ok(Self {
            source: BACKUP_SOURCE.to_string(),
            seed_phrase,
            date: date.to_rfc3339_opts(SecondsFormat::Millis, true),
            warning: BACKUP_WARNING.to_string(),
        })
    }

    pub fn from_json(content: &str) -> FundsuResult<Self> {
        let backup: WalletBackup = serde_json::from_str(content)
            .map_err(|e| FundsuError::parse_error("wallet backup", e))?;
        if backup.source != BACKUP_SOURCE {
            return Err(ValidationError::InvalidSeedPhrase {
                reason: format!("unsupported backup source '{}'", backup.source),
            }
            .into());
        }
        validate_seed_phrase(&backup.seed_phrase)?;
        Ok(backup)
    }

    pub fn to_json(&self) -> FundsuResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn keypair(&self) -> FundsuResult<Keypair> {
        keypair_from_words(&self.seed_phrase)
    }
}

pub fn keypair_from_words(words: &[String]) -> FundsuResult<Keypair> {
    validate_seed_phrase(words)?;
    keypair_from_seed_phrase_and_passphrase(&words.join(" "), "").map_err(|e| {
        FundsuError::from(ValidationError::InvalidSeedPhrase {
            reason: e.to_string(),
        })
    })
}

pub fn export_backup(path: &Path, backup: &WalletBackup) -> FundsuResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, backup.to_json()?)?;
    logger::info(LogTag::Wallet, &format!("Wallet backup written to {}", path.display()));
    Ok(())
}

pub fn import_backup(path: &Path) -> FundsuResult<WalletBackup> {
    let content = std::fs::read_to_string(path)?;
    let backup = WalletBackup::from_json(&content)?;
    logger::debug(LogTag::Wallet, &format!("Loaded wallet backup from {}", path.display()));
    Ok(backup)
}

/// Signing keypair from the backup file
pub fn load_keypair(path: &Path) -> FundsuResult<Keypair> {
    import_backup(path)?.keypair()
}
