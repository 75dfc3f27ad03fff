/// Command-line interface
///
/// Global logging flags apply to every subcommand; `--debug <tag>` may be
/// repeated and takes the keys listed by `LogTag::to_debug_key`.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CONFIG_FILE_PATH;
use crate::logger::{LogTag, LoggerConfig};

#[derive(Parser, Debug)]
#[command(name = "fundsu", version)]
#[command(about = "Reconciles FundsU campaign accounts into the document store")]
pub struct Cli {
    /// Path of the TOML configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_PATH)]
    pub config: String,

    /// Enable debug output for a subsystem (repeatable)
    #[arg(long = "debug", value_name = "TAG", global = true)]
    pub debug_tags: Vec<String>,

    #[arg(long, global = true)]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run one reconciliation pass, or loop when sync.interval_secs > 0
    Sync,
    /// List on-chain campaigns with their transfer counts
    Scan,
    /// Classified transfers and statistics for one campaign account
    Contributions {
        campaign: String,
        /// Signatures to inspect (defaults to fetcher.signature_limit)
        #[arg(long)]
        limit: Option<usize>,
        /// Expected withdrawal recipient
        #[arg(long)]
        author: Option<String>,
    },
    /// Start the HTTP API
    Serve,
    /// Seed-phrase backups of the local wallet
    Wallet {
        #[command(subcommand)]
        action: WalletCommand,
    },
    /// Submit campaign program instructions with the local wallet
    Campaign {
        #[command(subcommand)]
        action: CampaignCommand,
    },
    /// Off-chain profile of the local wallet
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum WalletCommand {
    /// Make a backup file the local wallet
    Import { file: PathBuf },
    /// Copy the local wallet to a backup file
    Export { file: PathBuf },
    /// Store a typed 12-word seed phrase as the local wallet
    Restore { words: String },
    /// Print the local wallet address
    Address,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CampaignCommand {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Target in SOL
        #[arg(long)]
        target: f64,
        #[arg(long, default_value = "")]
        image_url: String,
    },
    Contribute {
        campaign: String,
        /// Amount in SOL
        #[arg(long)]
        amount: f64,
    },
    /// Withdraw everything raised (author only)
    Withdraw { campaign: String },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProfileCommand {
    /// Create the profile if needed, refresh the balance and print it
    Show,
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
    },
}

impl Cli {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::from_flags(&self.debug_tags, self.verbose, self.quiet)
    }

    /// Debug tags that match no subsystem
    pub fn unknown_debug_tags(&self) -> Vec<String> {
        self.debug_tags
            .iter()
            .filter(|tag| {
                let key = tag.trim().to_lowercase();
                !LogTag::all().iter().any(|t| t.to_debug_key() == key)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fundsu", "sync", "--debug", "sync", "--debug", "Fetcher", "--config", "alt.toml",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Sync);
        assert_eq!(cli.config, "alt.toml");
        assert!(cli.unknown_debug_tags().is_empty());

        let logger = cli.logger_config();
        assert!(logger.debug_tags.contains("fetcher"));
    }

    #[test]
    fn defaults_to_standard_config_path() {
        let cli = Cli::try_parse_from(["fundsu", "serve"]).unwrap();
        assert_eq!(cli.config, CONFIG_FILE_PATH);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["fundsu", "--verbose", "--quiet", "scan"]).is_err());
    }

    #[test]
    fn unknown_tags_are_reported() {
        let cli = Cli::try_parse_from(["fundsu", "--debug", "pools", "scan"]).unwrap();
        assert_eq!(cli.unknown_debug_tags(), vec!["pools".to_string()]);
    }

    #[test]
    fn campaign_subcommands() {
        let cli = Cli::try_parse_from([
            "fundsu", "campaign", "contribute", "CampA", "--amount", "0.5",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Campaign {
                action: CampaignCommand::Contribute {
                    campaign: "CampA".to_string(),
                    amount: 0.5,
                }
            }
        );

        let cli = Cli::try_parse_from(["fundsu", "wallet", "restore", "a b c"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Wallet {
                action: WalletCommand::Restore {
                    words: "a b c".to_string()
                }
            }
        );
    }
}
