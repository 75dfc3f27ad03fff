//! Campaign program integration
//!
//! - `accounts`: discriminator-dispatched decoding of program accounts
//! - `scanner`: every on-chain campaign with its transfer history
//! - `actions`: create / contribute / withdraw plus the direct store writes

pub mod accounts;
pub mod actions;
pub mod scanner;

pub use accounts::{decode_account, group_accounts, CampaignAccount, DecodeError, ProgramAccountData};
pub use actions::{ActionReceipt, CampaignActions, CreateCampaignRequest};
pub use scanner::{CampaignWithHistory, ProgramScanner, ScanResult};
