// Reconciliation planning
//
// Pure decision step: given the on-chain campaigns and snapshots of the
// off-chain collections, produce one write batch and the report describing
// it. Nothing here touches the network or the store.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::campaigns::CampaignWithHistory;
use crate::store::{
    Campaign, CampaignPatch, CommitSummary, LedgerRecord, TransactionType, UserMerge, WriteBatch,
};
use crate::transactions::{ClassifiedTransfer, TransferKind};

/// Counts for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub campaigns_total: usize,
    pub campaigns_created: usize,
    /// Existing campaigns whose volatile fields diverged
    pub campaigns_updated: usize,
    pub campaigns_skipped: usize,
    pub transactions_total: usize,
    pub transactions_created: usize,
    pub transactions_skipped: usize,
    pub contributors_updated: usize,
    /// False when divergent campaigns were only reported
    pub updates_applied: bool,
}

impl SyncReport {
    pub fn created(&self) -> usize {
        self.campaigns_created + self.transactions_created
    }

    /// Move planned creates that the commit found already present into the skip counts
    pub fn settle(&mut self, summary: &CommitSummary) {
        let campaigns_lost = self.campaigns_created.saturating_sub(summary.campaigns_created);
        let transactions_lost = self
            .transactions_created
            .saturating_sub(summary.transactions_created);
        self.campaigns_created = summary.campaigns_created;
        self.transactions_created = summary.transactions_created;
        self.campaigns_skipped += campaigns_lost;
        self.transactions_skipped += transactions_lost;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub batch: WriteBatch,
    pub report: SyncReport,
}

/// Fields compared between the chain and the mirror
fn campaign_diff(onchain: &Campaign, existing: &Campaign) -> Option<CampaignPatch> {
    let diverged = onchain.current_amount != existing.current_amount
        || onchain.locked != existing.locked
        || onchain.contributors_count != existing.contributors_count
        || onchain.closed != existing.closed;
    if !diverged {
        return None;
    }
    Some(CampaignPatch {
        current_amount: Some(onchain.current_amount),
        locked: Some(onchain.locked),
        closed: Some(onchain.closed),
        contributors_count: Some(onchain.contributors_count),
        ..CampaignPatch::new(&existing.id)
    })
}

fn record_for_transfer(campaign: &Campaign, transfer: &ClassifiedTransfer, now: i64) -> Option<LedgerRecord> {
    let date = transfer.block_time.unwrap_or(now);
    let record = match transfer.kind {
        TransferKind::Contribution => LedgerRecord::completed(
            &transfer.signature,
            TransactionType::Contribution,
            transfer.lamports,
            &transfer.from,
            date,
            format!("Contribution to campaign: {}", campaign.title),
        )
        .to_recipient(&campaign.author),
        TransferKind::Withdrawal => LedgerRecord::completed(
            &transfer.signature,
            TransactionType::Withdraw,
            transfer.lamports,
            &transfer.to,
            date,
            format!("Withdrawal from {} campaign", campaign.title),
        ),
        TransferKind::Other => return None,
    };
    Some(record.for_campaign(&campaign.id))
}

/// Decide every create and update for one pass
pub fn plan_sync(
    onchain: &[CampaignWithHistory],
    existing_campaigns: &[Campaign],
    existing_records: &[LedgerRecord],
    apply_campaign_updates: bool,
    now: i64,
) -> SyncPlan {
    let mut batch = WriteBatch::new();
    let mut report = SyncReport {
        campaigns_total: onchain.len(),
        updates_applied: apply_campaign_updates,
        ..SyncReport::default()
    };

    let campaigns_by_key: HashMap<&str, &Campaign> = existing_campaigns
        .iter()
        .map(|c| (c.campaign_wallet_key.as_str(), c))
        .collect();
    let existing_keys: HashSet<&str> = existing_records.iter().map(|r| r.id.as_str()).collect();
    let mut planned_keys: HashSet<String> = HashSet::new();

    // Running totals start from what the mirror already holds
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for record in existing_records
        .iter()
        .filter(|r| r.tx_type == TransactionType::Contribution)
    {
        *totals.entry(record.user_id.clone()).or_default() += record.amount;
    }
    let mut touched_contributors: BTreeSet<String> = BTreeSet::new();

    for entry in onchain {
        let campaign = &entry.campaign;

        match campaigns_by_key.get(campaign.campaign_wallet_key.as_str()) {
            None => {
                batch.create_campaign(campaign.clone());
                report.campaigns_created += 1;

                let key = campaign.tx_hash.as_str();
                if !key.is_empty() && !existing_keys.contains(key) && planned_keys.insert(key.to_string()) {
                    batch.create_transaction(
                        LedgerRecord::completed(
                            key,
                            TransactionType::CampaignCreated,
                            0,
                            &campaign.author,
                            campaign.timestamp,
                            format!("Created campaign: {}", campaign.title),
                        )
                        .for_campaign(&campaign.id),
                    );
                    report.transactions_created += 1;
                }
            }
            Some(existing) => match campaign_diff(campaign, existing) {
                Some(patch) => {
                    report.campaigns_updated += 1;
                    if apply_campaign_updates {
                        batch.patch_campaign(patch);
                    }
                }
                None => report.campaigns_skipped += 1,
            },
        }

        for transfer in &entry.transfers {
            let Some(record) = record_for_transfer(campaign, transfer, now) else {
                continue;
            };
            report.transactions_total += 1;

            if existing_keys.contains(record.id.as_str()) || !planned_keys.insert(record.id.clone()) {
                report.transactions_skipped += 1;
                continue;
            }

            if record.tx_type == TransactionType::Contribution {
                *totals.entry(record.user_id.clone()).or_default() += record.amount;
                touched_contributors.insert(record.user_id.clone());
            }
            batch.create_transaction(record);
            report.transactions_created += 1;
        }
    }

    for contributor in touched_contributors {
        let total = totals.get(&contributor).copied().unwrap_or_default();
        batch.merge_user(UserMerge {
            total_contributions: Some(total),
            ..UserMerge::new(&contributor)
        });
        report.contributors_updated += 1;
    }

    SyncPlan { batch, report }
}
