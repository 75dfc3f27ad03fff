// In-memory document store
//
// Backs tests and `store.backend = "memory"`. A batch is applied to a copy of
// the documents and swapped in only when every operation succeeded.

use super::batch::{CommitSummary, WriteBatch, WriteOp};
use super::models::{Campaign, LedgerRecord, UserProfile};
use super::subscription::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
use super::{Collection, DocumentStore, TransactionFilter};
use crate::errors::{FundsuError, FundsuResult};
use crate::utils::unix_now;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Documents {
    campaigns: HashMap<String, Campaign>,
    transactions: HashMap<String, LedgerRecord>,
    users: HashMap<String, UserProfile>,
}

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Documents>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn change(collection: Collection, id: &str, kind: ChangeKind) -> ChangeEvent {
    ChangeEvent {
        collection,
        id: id.to_string(),
        kind,
    }
}

fn apply(
    docs: &mut Documents,
    batch: WriteBatch,
    now: i64,
) -> FundsuResult<(CommitSummary, Vec<ChangeEvent>)> {
    let mut summary = CommitSummary::default();
    let mut events = Vec::new();

    for op in batch.ops {
        match op {
            WriteOp::CreateCampaign(campaign) => {
                if docs.campaigns.contains_key(&campaign.id) {
                    summary.skipped.push(campaign.id);
                } else {
                    events.push(change(Collection::Campaigns, &campaign.id, ChangeKind::Created));
                    docs.campaigns.insert(campaign.id.clone(), campaign);
                    summary.campaigns_created += 1;
                }
            }
            WriteOp::CreateTransaction(record) => {
                if docs.transactions.contains_key(&record.id) {
                    summary.skipped.push(record.id);
                } else {
                    events.push(change(Collection::Transactions, &record.id, ChangeKind::Created));
                    docs.transactions.insert(record.id.clone(), record);
                    summary.transactions_created += 1;
                }
            }
            WriteOp::PatchCampaign(patch) => {
                let campaign = docs
                    .campaigns
                    .get_mut(&patch.id)
                    .ok_or_else(|| FundsuError::not_found("campaigns", patch.id.clone()))?;
                patch.apply(campaign);
                events.push(change(Collection::Campaigns, &patch.id, ChangeKind::Updated));
                summary.campaigns_patched += 1;
            }
            WriteOp::MergeUser(merge) => {
                let existing = docs.users.remove(&merge.id);
                let kind = if existing.is_some() {
                    ChangeKind::Updated
                } else {
                    ChangeKind::Created
                };
                let profile = merge.apply(existing, now);
                events.push(change(Collection::Users, &merge.id, kind));
                docs.users.insert(merge.id.clone(), profile);
                summary.users_merged += 1;
            }
        }
    }

    Ok((summary, events))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn campaigns(&self) -> FundsuResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self.documents.read().campaigns.values().cloned().collect();
        campaigns.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(campaigns)
    }

    async fn campaign(&self, id: &str) -> FundsuResult<Option<Campaign>> {
        Ok(self.documents.read().campaigns.get(id).cloned())
    }

    async fn transactions(&self) -> FundsuResult<Vec<LedgerRecord>> {
        self.transactions_matching(&TransactionFilter::default()).await
    }

    async fn transactions_matching(&self, filter: &TransactionFilter) -> FundsuResult<Vec<LedgerRecord>> {
        let mut records: Vec<LedgerRecord> = self
            .documents
            .read()
            .transactions
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn user(&self, id: &str) -> FundsuResult<Option<UserProfile>> {
        Ok(self.documents.read().users.get(id).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> FundsuResult<CommitSummary> {
        let (summary, events) = {
            let mut documents = self.documents.write();
            let mut staged = documents.clone();
            let result = apply(&mut staged, batch, unix_now())?;
            *documents = staged;
            result
        };
        self.feed.publish(events);
        Ok(summary)
    }

    fn subscribe(&self, collection: Collection) -> Subscription {
        self.feed.subscribe(collection)
    }
}
