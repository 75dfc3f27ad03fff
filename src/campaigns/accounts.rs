/// Campaign program account decoding
///
/// Anchor prefixes every account with `sha256("account:<Name>")[..8]`. The
/// decoder dispatches on that prefix instead of trying each layout in turn;
/// accounts with an unknown prefix land in the `unknown` bucket.
use std::collections::BTreeMap;

use borsh::BorshDeserialize;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

use crate::rpc::ProgramAccount;

pub const DISCRIMINATOR_LEN: usize = 8;

/// Bucket name for accounts no known layout claims
pub const UNKNOWN_ACCOUNT_TYPE: &str = "unknown";

pub fn account_discriminator(account_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    anchor_discriminator("account", account_name)
}

pub fn instruction_discriminator(instruction_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    anchor_discriminator("global", instruction_name)
}

fn anchor_discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("account data too short: {len} bytes")]
    TooShort { len: usize },

    #[error("unknown account discriminator {0:?}")]
    UnknownDiscriminator([u8; DISCRIMINATOR_LEN]),

    #[error("malformed {account_type} account: {reason}")]
    Malformed {
        account_type: &'static str,
        reason: String,
    },
}

// =============================================================================
// ACCOUNT LAYOUTS
// =============================================================================

/// On-chain `Campaign` account body (after the discriminator)
#[derive(Debug, Clone, PartialEq, BorshDeserialize, borsh::BorshSerialize)]
pub struct CampaignAccount {
    pub author: [u8; 32],
    pub title: String,
    pub description: String,
    pub target_amount: u64,
    pub current_amount: u64,
    pub locked: bool,
    pub likes: u64,
    pub dislikes: u64,
    pub bump: u8,
}

impl CampaignAccount {
    pub const ACCOUNT_NAME: &'static str = "Campaign";

    pub fn author(&self) -> Pubkey {
        Pubkey::new_from_array(self.author)
    }
}

/// Every account type the campaign program owns
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramAccountData {
    Campaign(CampaignAccount),
}

impl ProgramAccountData {
    pub fn type_name(&self) -> &'static str {
        match self {
            ProgramAccountData::Campaign(_) => CampaignAccount::ACCOUNT_NAME,
        }
    }
}

type LayoutDecoder = fn(&[u8]) -> Result<ProgramAccountData, DecodeError>;

fn decode_campaign(body: &[u8]) -> Result<ProgramAccountData, DecodeError> {
    // Accounts are allocated at max size, so trailing zero bytes are expected
    let mut cursor = body;
    CampaignAccount::deserialize(&mut cursor)
        .map(ProgramAccountData::Campaign)
        .map_err(|e| DecodeError::Malformed {
            account_type: CampaignAccount::ACCOUNT_NAME,
            reason: e.to_string(),
        })
}

static KNOWN_LAYOUTS: Lazy<Vec<([u8; DISCRIMINATOR_LEN], LayoutDecoder)>> = Lazy::new(|| {
    vec![(
        account_discriminator(CampaignAccount::ACCOUNT_NAME),
        decode_campaign as LayoutDecoder,
    )]
});

/// Decode raw account data by its discriminator
pub fn decode_account(data: &[u8]) -> Result<ProgramAccountData, DecodeError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(DecodeError::TooShort { len: data.len() });
    }
    let mut prefix = [0u8; DISCRIMINATOR_LEN];
    prefix.copy_from_slice(&data[..DISCRIMINATOR_LEN]);

    KNOWN_LAYOUTS
        .iter()
        .find(|(discriminator, _)| *discriminator == prefix)
        .ok_or(DecodeError::UnknownDiscriminator(prefix))
        .and_then(|(_, decode)| decode(&data[DISCRIMINATOR_LEN..]))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAccount {
    pub pubkey: String,
    pub data: ProgramAccountData,
}

/// Program accounts grouped by type name
#[derive(Debug, Clone, Default)]
pub struct GroupedAccounts {
    pub by_type: BTreeMap<&'static str, Vec<DecodedAccount>>,
    /// Pubkeys of accounts that matched no layout
    pub unknown: Vec<String>,
}

impl GroupedAccounts {
    pub fn campaigns(&self) -> impl Iterator<Item = (&str, &CampaignAccount)> {
        self.by_type
            .get(CampaignAccount::ACCOUNT_NAME)
            .into_iter()
            .flatten()
            .map(|account| match &account.data {
                ProgramAccountData::Campaign(campaign) => (account.pubkey.as_str(), campaign),
            })
    }

    /// Per-type counts including the unknown bucket
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = self
            .by_type
            .iter()
            .map(|(name, accounts)| (name.to_string(), accounts.len()))
            .collect();
        if !self.unknown.is_empty() {
            counts.insert(UNKNOWN_ACCOUNT_TYPE.to_string(), self.unknown.len());
        }
        counts
    }
}

pub fn group_accounts(accounts: &[ProgramAccount]) -> GroupedAccounts {
    let mut grouped = GroupedAccounts::default();
    for account in accounts {
        match decode_account(&account.data) {
            Ok(data) => grouped
                .by_type
                .entry(data.type_name())
                .or_default()
                .push(DecodedAccount {
                    pubkey: account.pubkey.clone(),
                    data,
                }),
            Err(_) => grouped.unknown.push(account.pubkey.clone()),
        }
    }
    grouped
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    pub fn campaign_account(author: &Pubkey, title: &str, target: u64, current: u64) -> CampaignAccount {
        CampaignAccount {
            author: author.to_bytes(),
            title: title.to_string(),
            description: format!("{} description", title),
            target_amount: target,
            current_amount: current,
            locked: current < target,
            likes: 0,
            dislikes: 0,
            bump: 254,
        }
    }

    /// Account data as the program lays it out, padded like a max-size allocation
    pub fn encode_campaign(account: &CampaignAccount) -> Vec<u8> {
        let mut data = account_discriminator(CampaignAccount::ACCOUNT_NAME).to_vec();
        data.extend(borsh::to_vec(account).unwrap());
        data.extend([0u8; 16]);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn program_account(pubkey: &str, data: Vec<u8>) -> ProgramAccount {
        ProgramAccount {
            pubkey: pubkey.to_string(),
            owner: "9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr".to_string(),
            lamports: 1_000_000,
            data,
        }
    }

    #[test]
    fn discriminators_follow_anchor_namespaces() {
        assert_ne!(account_discriminator("Campaign"), instruction_discriminator("Campaign"));
        assert_eq!(account_discriminator("Campaign"), account_discriminator("Campaign"));
    }

    #[test]
    fn decodes_padded_campaign() {
        let author = Pubkey::new_unique();
        let account = campaign_account(&author, "Solar", 5_000, 1_200);
        let decoded = decode_account(&encode_campaign(&account)).unwrap();
        match decoded {
            ProgramAccountData::Campaign(c) => {
                assert_eq!(c.title, "Solar");
                assert_eq!(c.author(), author);
                assert_eq!(c.current_amount, 1_200);
            }
        }
    }

    #[test]
    fn rejects_short_and_unknown_data() {
        assert_eq!(decode_account(&[1, 2, 3]), Err(DecodeError::TooShort { len: 3 }));
        let unknown = account_discriminator("Vault").to_vec();
        assert!(matches!(
            decode_account(&unknown),
            Err(DecodeError::UnknownDiscriminator(_))
        ));
    }

    #[test]
    fn truncated_campaign_is_malformed() {
        let account = campaign_account(&Pubkey::new_unique(), "Solar", 5_000, 0);
        let mut data = encode_campaign(&account);
        data.truncate(DISCRIMINATOR_LEN + 40);
        assert!(matches!(decode_account(&data), Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn grouping_buckets_unknown_accounts() {
        let account = campaign_account(&Pubkey::new_unique(), "Solar", 5_000, 0);
        let accounts = vec![
            program_account("Camp1", encode_campaign(&account)),
            program_account("Other1", vec![0u8; 64]),
        ];
        let grouped = group_accounts(&accounts);

        assert_eq!(grouped.campaigns().count(), 1);
        assert_eq!(grouped.unknown, vec!["Other1".to_string()]);
        let counts = grouped.counts();
        assert_eq!(counts.get("Campaign"), Some(&1));
        assert_eq!(counts.get(UNKNOWN_ACCOUNT_TYPE), Some(&1));
    }
}
