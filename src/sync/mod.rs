//! Reconciliation of the on-chain campaign set into the document store
//!
//! One pass: scan the program, snapshot the mirror, plan, commit one batch.
//! The batch is all-or-nothing; the read-plan-write sequence is not isolated
//! from concurrent writers, and record-keyed create-if-absent keeps an
//! overlapping pass from duplicating documents.

pub mod plan;

pub use plan::{plan_sync, SyncPlan, SyncReport};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::campaigns::ProgramScanner;
use crate::config::SyncConfig;
use crate::errors::FundsuResult;
use crate::logger::{self, LogTag};
use crate::store::DocumentStore;
use crate::utils::{check_shutdown_or_delay, unix_now};

pub struct ReconciliationSync {
    scanner: ProgramScanner,
    store: Arc<dyn DocumentStore>,
    config: SyncConfig,
}

impl ReconciliationSync {
    pub fn new(scanner: ProgramScanner, store: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
        Self {
            scanner,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// One full pass; any read or write error aborts it
    pub async fn run_once(&self) -> FundsuResult<SyncReport> {
        let start_time = Instant::now();
        logger::info(LogTag::Sync, "Starting reconciliation pass");

        let scan = self.scanner.scan().await?;
        if scan.campaigns.is_empty() {
            logger::info(LogTag::Sync, "No campaigns found on chain");
            return Ok(SyncReport {
                updates_applied: self.config.apply_campaign_updates,
                ..SyncReport::default()
            });
        }

        let existing_campaigns = self.store.campaigns().await?;
        let existing_records = self.store.transactions().await?;
        logger::debug(
            LogTag::Sync,
            &format!(
                "Mirror holds {} campaigns and {} transactions",
                existing_campaigns.len(),
                existing_records.len()
            ),
        );

        let SyncPlan { batch, mut report } = plan_sync(
            &scan.campaigns,
            &existing_campaigns,
            &existing_records,
            self.config.apply_campaign_updates,
            unix_now(),
        );

        if !batch.is_empty() {
            let summary = self.store.commit(batch).await?;
            if !summary.skipped.is_empty() {
                // Another writer created these between our read and commit
                logger::warning(
                    LogTag::Sync,
                    &format!("{} documents already existed at commit time", summary.skipped.len()),
                );
            }
            report.settle(&summary);
        }

        if report.campaigns_updated > 0 && !self.config.apply_campaign_updates {
            logger::warning(
                LogTag::Sync,
                &format!(
                    "{} campaigns diverge from chain; updates disabled",
                    report.campaigns_updated
                ),
            );
        }

        logger::info(
            LogTag::Sync,
            &format!(
                "Sync completed in {}ms: campaigns {} total / {} created / {} updated / {} skipped, transactions {} total / {} created / {} skipped",
                start_time.elapsed().as_millis(),
                report.campaigns_total,
                report.campaigns_created,
                report.campaigns_updated,
                report.campaigns_skipped,
                report.transactions_total,
                report.transactions_created,
                report.transactions_skipped
            ),
        );

        Ok(report)
    }

    /// Repeat `run_once` every `interval_secs` until `shutdown` fires
    ///
    /// A failed pass is logged and abandoned; the loop keeps going.
    pub async fn run_loop(&self, shutdown: Arc<Notify>) {
        let interval = Duration::from_secs(self.config.interval_secs.max(1));
        loop {
            if let Err(e) = self.run_once().await {
                logger::error(LogTag::Sync, &format!("Reconciliation pass failed: {}", e));
            }
            if check_shutdown_or_delay(&shutdown, interval).await {
                logger::info(LogTag::Sync, "Sync loop stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::accounts::test_support::{campaign_account, encode_campaign};
    use crate::config::{FetcherConfig, ProgramConfig, ScannerConfig};
    use crate::rpc::mock::{MockLedger, TxBuilder};
    use crate::rpc::ProgramAccount;
    use crate::store::{MemoryStore, TransactionFilter, TransactionType};
    use solana_sdk::pubkey::Pubkey;

    const PROGRAM: &str = "9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr";

    fn service(ledger: Arc<MockLedger>, store: Arc<MemoryStore>) -> ReconciliationSync {
        let scanner = ProgramScanner::new(
            ledger,
            &ProgramConfig::default(),
            ScannerConfig::default(),
            FetcherConfig {
                batch_delay_ms: 0,
                ..FetcherConfig::default()
            },
        );
        ReconciliationSync::new(scanner, store, SyncConfig::default())
    }

    fn seed_campaign(ledger: &MockLedger, address: &str, author: &Pubkey, target: u64, current: u64) {
        ledger.push_account(ProgramAccount {
            pubkey: address.to_string(),
            owner: PROGRAM.to_string(),
            lamports: 2_000_000,
            data: encode_campaign(&campaign_account(author, "Library", target, current)),
        });
    }

    #[tokio::test]
    async fn second_pass_creates_nothing() {
        let ledger = Arc::new(MockLedger::new());
        let store = Arc::new(MemoryStore::new());
        let author = Pubkey::new_unique();

        ledger.push_transaction(TxBuilder::new("create", 100).opaque_call(PROGRAM, &["CampA"]).build());
        ledger.push_transaction(TxBuilder::new("give-1", 200).transfer("Backer1", "CampA", 4_000).build());
        ledger.push_transaction(TxBuilder::new("give-2", 300).transfer("Backer2", "CampA", 6_000).build());
        seed_campaign(&ledger, "CampA", &author, 50_000, 10_000);

        let sync = service(ledger, store.clone());
        let first = sync.run_once().await.unwrap();
        assert_eq!(first.campaigns_created, 1);
        assert_eq!(first.transactions_created, 3);
        assert_eq!(first.contributors_updated, 2);

        let second = sync.run_once().await.unwrap();
        assert_eq!(second.created(), 0);
        assert_eq!(second.campaigns_skipped, 1);
        assert_eq!(second.transactions_skipped, 2);
        assert_eq!(store.transactions().await.unwrap().len(), 3);

        let backer = store.user("Backer2").await.unwrap().unwrap();
        assert_eq!(backer.total_contributions, 6_000);
        let contributions = store
            .transactions_matching(&TransactionFilter {
                tx_type: Some(TransactionType::Contribution),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(contributions.len(), 2);
    }

    #[tokio::test]
    async fn reaching_target_unlocks_mirrored_campaign() {
        let ledger = Arc::new(MockLedger::new());
        let store = Arc::new(MemoryStore::new());
        let author = Pubkey::new_unique();

        ledger.push_transaction(TxBuilder::new("create", 100).opaque_call(PROGRAM, &["CampB"]).build());
        seed_campaign(&ledger, "CampB", &author, 1_000, 0);
        let sync = service(ledger.clone(), store.clone());
        sync.run_once().await.unwrap();
        assert!(store.campaign("CampB").await.unwrap().unwrap().locked);

        // The contribution lands and the account now holds the full target
        ledger.push_transaction(TxBuilder::new("give", 200).transfer("Backer1", "CampB", 1_000).build());
        seed_campaign(&ledger, "CampB", &author, 1_000, 1_000);
        let report = sync.run_once().await.unwrap();

        assert_eq!(report.campaigns_updated, 1);
        let campaign = store.campaign("CampB").await.unwrap().unwrap();
        assert_eq!(campaign.current_amount, 1_000);
        assert!(!campaign.locked);
        assert_eq!(campaign.contributors_count, 1);
    }

    #[tokio::test]
    async fn long_history_keeps_full_contributor_count() {
        let ledger = Arc::new(MockLedger::new());
        let store = Arc::new(MemoryStore::new());
        let author = Pubkey::new_unique();

        ledger.push_transaction(TxBuilder::new("create", 1).opaque_call(PROGRAM, &["CampC"]).build());
        for i in 0..120 {
            ledger.push_transaction(
                TxBuilder::new(&format!("give-{}", i), 10 + i)
                    .transfer(&format!("Backer{}", i), "CampC", 1_000)
                    .build(),
            );
        }
        seed_campaign(&ledger, "CampC", &author, 1_000_000, 120_000);

        // Default scanner page size is below the history length
        assert!(ScannerConfig::default().signature_limit < 121);
        let sync = service(ledger, store.clone());
        let first = sync.run_once().await.unwrap();
        assert_eq!(first.transactions_created, 121);

        let second = sync.run_once().await.unwrap();
        assert_eq!(second.campaigns_updated, 0);
        assert_eq!(second.campaigns_skipped, 1);
        let campaign = store.campaign("CampC").await.unwrap().unwrap();
        assert_eq!(campaign.contributors_count, 120);
        assert_eq!(campaign.tx_hash, "create");
    }

    #[tokio::test]
    async fn empty_program_is_a_no_op() {
        let ledger = Arc::new(MockLedger::new());
        let store = Arc::new(MemoryStore::new());
        let report = service(ledger, store.clone()).run_once().await.unwrap();
        assert_eq!(report.campaigns_total, 0);
        assert!(store.campaigns().await.unwrap().is_empty());
    }
}
