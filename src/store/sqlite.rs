// SQLite-backed document store
//
// Each document is stored as JSON next to the columns it is queried by. One
// SQLite transaction per batch gives all-or-nothing commits.

use super::batch::{CommitSummary, WriteBatch, WriteOp};
use super::models::{Campaign, LedgerRecord, UserProfile};
use super::subscription::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
use super::{Collection, DocumentStore, TransactionFilter};
use crate::errors::{FundsuError, FundsuResult, StoreError};
use crate::logger::{self, LogTag};
use crate::utils::unix_now;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::path::Path;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> FundsuResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| FundsuError::store_read("database", format!("open {}: {}", path.display(), e)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> FundsuResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FundsuError::store_read("database", e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> FundsuResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> FundsuResult<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                author TEXT NOT NULL,
                timestamp INTEGER NOT NULL DEFAULT 0,
                doc TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                tx_type TEXT NOT NULL,
                campaign_id TEXT,
                date INTEGER NOT NULL DEFAULT 0,
                doc TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_campaign_id ON transactions(campaign_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(tx_type)",
            [],
        )?;

        Ok(())
    }
}

fn decode<T: DeserializeOwned>(collection: &str, id: &str, doc: &str) -> FundsuResult<T> {
    serde_json::from_str(doc).map_err(|e| {
        FundsuError::Store(StoreError::Corrupt {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: e.to_string(),
        })
    })
}

fn read_error(collection: &str) -> impl Fn(rusqlite::Error) -> FundsuError + '_ {
    move |e| FundsuError::store_read(collection, e.to_string())
}

fn change(collection: Collection, id: &str, kind: ChangeKind) -> ChangeEvent {
    ChangeEvent {
        collection,
        id: id.to_string(),
        kind,
    }
}

fn apply(
    tx: &rusqlite::Transaction<'_>,
    batch: WriteBatch,
    now: i64,
) -> FundsuResult<(CommitSummary, Vec<ChangeEvent>)> {
    let mut summary = CommitSummary::default();
    let mut events = Vec::new();

    for op in batch.ops {
        match op {
            WriteOp::CreateCampaign(campaign) => {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO campaigns (id, author, timestamp, doc) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        campaign.id,
                        campaign.author,
                        campaign.timestamp,
                        serde_json::to_string(&campaign)?
                    ],
                )?;
                if inserted == 0 {
                    summary.skipped.push(campaign.id);
                } else {
                    events.push(change(Collection::Campaigns, &campaign.id, ChangeKind::Created));
                    summary.campaigns_created += 1;
                }
            }
            WriteOp::CreateTransaction(record) => {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO transactions (id, user_id, tx_type, campaign_id, date, doc)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        record.id,
                        record.user_id,
                        record.tx_type.as_str(),
                        record.campaign_id,
                        record.date,
                        serde_json::to_string(&record)?
                    ],
                )?;
                if inserted == 0 {
                    summary.skipped.push(record.id);
                } else {
                    events.push(change(Collection::Transactions, &record.id, ChangeKind::Created));
                    summary.transactions_created += 1;
                }
            }
            WriteOp::PatchCampaign(patch) => {
                let doc: Option<String> = tx
                    .query_row(
                        "SELECT doc FROM campaigns WHERE id = ?1",
                        params![patch.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let doc = doc.ok_or_else(|| FundsuError::not_found("campaigns", patch.id.clone()))?;
                let mut campaign: Campaign = decode("campaigns", &patch.id, &doc)?;
                patch.apply(&mut campaign);
                tx.execute(
                    "UPDATE campaigns SET doc = ?2 WHERE id = ?1",
                    params![patch.id, serde_json::to_string(&campaign)?],
                )?;
                events.push(change(Collection::Campaigns, &patch.id, ChangeKind::Updated));
                summary.campaigns_patched += 1;
            }
            WriteOp::MergeUser(merge) => {
                let doc: Option<String> = tx
                    .query_row("SELECT doc FROM users WHERE id = ?1", params![merge.id], |row| row.get(0))
                    .optional()?;
                let existing: Option<UserProfile> = match doc {
                    Some(doc) => Some(decode("users", &merge.id, &doc)?),
                    None => None,
                };
                let kind = if existing.is_some() {
                    ChangeKind::Updated
                } else {
                    ChangeKind::Created
                };
                let profile = merge.apply(existing, now);
                tx.execute(
                    "INSERT OR REPLACE INTO users (id, doc) VALUES (?1, ?2)",
                    params![merge.id, serde_json::to_string(&profile)?],
                )?;
                events.push(change(Collection::Users, &merge.id, kind));
                summary.users_merged += 1;
            }
        }
    }

    Ok((summary, events))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn campaigns(&self) -> FundsuResult<Vec<Campaign>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, doc FROM campaigns ORDER BY timestamp DESC, id ASC")
            .map_err(read_error("campaigns"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(read_error("campaigns"))?;

        let mut campaigns = Vec::new();
        for row in rows {
            let (id, doc) = row.map_err(read_error("campaigns"))?;
            campaigns.push(decode("campaigns", &id, &doc)?);
        }
        Ok(campaigns)
    }

    async fn campaign(&self, id: &str) -> FundsuResult<Option<Campaign>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM campaigns WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(read_error("campaigns"))?;
        doc.map(|doc| decode("campaigns", id, &doc)).transpose()
    }

    async fn transactions(&self) -> FundsuResult<Vec<LedgerRecord>> {
        self.transactions_matching(&TransactionFilter::default()).await
    }

    async fn transactions_matching(&self, filter: &TransactionFilter) -> FundsuResult<Vec<LedgerRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, doc FROM transactions
                 WHERE (?1 IS NULL OR user_id = ?1)
                   AND (?2 IS NULL OR tx_type = ?2)
                   AND (?3 IS NULL OR campaign_id = ?3)
                 ORDER BY date DESC, id ASC",
            )
            .map_err(read_error("transactions"))?;
        let rows = stmt
            .query_map(
                params![
                    filter.user_id,
                    filter.tx_type.map(|t| t.as_str()),
                    filter.campaign_id
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .map_err(read_error("transactions"))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, doc) = row.map_err(read_error("transactions"))?;
            records.push(decode("transactions", &id, &doc)?);
        }
        Ok(records)
    }

    async fn user(&self, id: &str) -> FundsuResult<Option<UserProfile>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM users WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(read_error("users"))?;
        doc.map(|doc| decode("users", id, &doc)).transpose()
    }

    async fn commit(&self, batch: WriteBatch) -> FundsuResult<CommitSummary> {
        let op_count = batch.len();
        let (summary, events) = {
            let mut conn = self.conn.lock();
            let tx = conn.transaction()?;
            // Dropping `tx` on error rolls back
            let result = apply(&tx, batch, unix_now())?;
            tx.commit()?;
            result
        };

        logger::debug(
            LogTag::Store,
            &format!(
                "Committed batch of {} ops ({} skipped)",
                op_count,
                summary.skipped.len()
            ),
        );

        self.feed.publish(events);
        Ok(summary)
    }

    fn subscribe(&self, collection: Collection) -> Subscription {
        self.feed.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::batch::{CampaignPatch, UserMerge};
    use crate::store::models::TransactionType;

    fn campaign(id: &str, timestamp: i64) -> Campaign {
        Campaign {
            id: id.to_string(),
            campaign_wallet_key: id.to_string(),
            author: "author".to_string(),
            title: format!("Campaign {}", id),
            target_amount: 1_000,
            timestamp,
            ..Campaign::default()
        }
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fundsu.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch
                .create_campaign(campaign("c1", 10))
                .create_transaction(
                    LedgerRecord::completed("tx1", TransactionType::CampaignCreated, 0, "author", 10, "Created campaign: c1".to_string())
                        .for_campaign("c1"),
                );
            let summary = store.commit(batch).await.unwrap();
            assert_eq!(summary.campaigns_created, 1);
            assert_eq!(summary.transactions_created, 1);
        }

        let store = SqliteStore::open(&path).unwrap();
        let loaded = store.campaign("c1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Campaign c1");
        assert!(loaded.locked);
        assert_eq!(store.transactions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_creates_are_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch.create_campaign(campaign("c1", 1)).create_campaign(campaign("c1", 2));
        let summary = store.commit(batch).await.unwrap();

        assert_eq!(summary.campaigns_created, 1);
        assert_eq!(summary.skipped, vec!["c1".to_string()]);
        assert_eq!(store.campaign("c1").await.unwrap().unwrap().timestamp, 1);
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_trace() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .create_campaign(campaign("c1", 1))
            .merge_user(UserMerge::new("alice"))
            .patch_campaign(CampaignPatch::new("missing"));

        assert!(store.commit(batch).await.is_err());
        assert!(store.campaigns().await.unwrap().is_empty());
        assert!(store.user("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_and_merge_apply_increments() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch.create_campaign(campaign("c1", 1));
        store.commit(batch).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .patch_campaign(CampaignPatch {
                increment_current_amount: 1_000,
                increment_contributors: 1,
                locked: Some(false),
                ..CampaignPatch::new("c1")
            })
            .merge_user(UserMerge {
                increment_total_contributions: 1_000,
                add_campaigns_contributed: vec!["c1".to_string()],
                ..UserMerge::new("alice")
            });
        store.commit(batch).await.unwrap();

        let updated = store.campaign("c1").await.unwrap().unwrap();
        assert_eq!(updated.current_amount, 1_000);
        assert_eq!(updated.contributors_count, 1);
        assert!(!updated.locked);

        let alice = store.user("alice").await.unwrap().unwrap();
        assert_eq!(alice.total_contributions, 1_000);
        assert_eq!(alice.campaigns_contributed, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn transaction_filters_use_columns() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .create_transaction(
                LedgerRecord::completed("a", TransactionType::Contribution, 5, "alice", 1, String::new())
                    .for_campaign("c1"),
            )
            .create_transaction(
                LedgerRecord::completed("b", TransactionType::Contribution, 6, "bob", 2, String::new())
                    .for_campaign("c1"),
            )
            .create_transaction(
                LedgerRecord::completed("c", TransactionType::Withdraw, 7, "alice", 3, String::new())
                    .for_campaign("c1"),
            );
        store.commit(batch).await.unwrap();

        let filter = TransactionFilter {
            campaign_id: Some("c1".to_string()),
            tx_type: Some(TransactionType::Contribution),
            ..TransactionFilter::default()
        };
        let ids: Vec<String> = store
            .transactions_matching(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }
}
