//! Off-chain document store
//!
//! Three collections mirror the chain for the UI: `users` keyed by wallet
//! address, `campaigns` keyed by campaign address and `transactions` keyed by
//! transaction hash. Reads return plain snapshots; live updates go through
//! `subscribe`.

pub mod batch;
pub mod memory;
pub mod models;
pub mod records;
pub mod sqlite;
pub mod subscription;

pub use batch::{CampaignPatch, CommitSummary, UserMerge, WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use models::{
    Campaign, CampaignUpdate, LedgerRecord, SocialLinks, TransactionStatus, TransactionType,
    UserProfile,
};
pub use sqlite::SqliteStore;
pub use subscription::{ChangeEvent, ChangeKind, Subscription};

use crate::config::{StoreBackend, StoreConfig};
use crate::errors::FundsuResult;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Campaigns,
    Transactions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Campaigns => "campaigns",
            Collection::Transactions => "transactions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Equality filters for ledger record queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub campaign_id: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, record: &LedgerRecord) -> bool {
        self.user_id.as_ref().map_or(true, |u| &record.user_id == u)
            && self.tx_type.map_or(true, |t| record.tx_type == t)
            && self
                .campaign_id
                .as_ref()
                .map_or(true, |c| record.campaign_id.as_ref() == Some(c))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn campaigns(&self) -> FundsuResult<Vec<Campaign>>;

    async fn campaign(&self, id: &str) -> FundsuResult<Option<Campaign>>;

    async fn transactions(&self) -> FundsuResult<Vec<LedgerRecord>>;

    /// Matching records, newest first
    async fn transactions_matching(&self, filter: &TransactionFilter) -> FundsuResult<Vec<LedgerRecord>>;

    async fn user(&self, id: &str) -> FundsuResult<Option<UserProfile>>;

    /// Apply every operation or none
    async fn commit(&self, batch: WriteBatch) -> FundsuResult<CommitSummary>;

    fn subscribe(&self, collection: Collection) -> Subscription;
}

/// Open the backend selected in `config`
pub fn open_store(config: &StoreConfig) -> FundsuResult<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => {
            logger::info(LogTag::Store, "Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            logger::info(LogTag::Store, &format!("Opening SQLite store at {}", config.path));
            Ok(Arc::new(SqliteStore::open(&config.path)?))
        }
    }
}
