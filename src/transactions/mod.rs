//! Campaign transfer history
//!
//! - `classifier`: one parsed transaction -> classified transfers
//! - `fetcher`: bounded, batched history fetch for one account
//! - `stats`: aggregate statistics over classified transfers

pub mod classifier;
pub mod fetcher;
pub mod stats;
pub mod types;

pub use classifier::TransferClassifier;
pub use fetcher::{deduplicate, ContributionFetcher, FetchOptions, FetchedHistory};
pub use stats::aggregate;
pub use types::{ClassifiedTransfer, ContributionStats, TransferKind};
