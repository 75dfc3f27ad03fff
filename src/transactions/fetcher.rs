// History fetching for a single campaign account
//
// Signatures are listed one page or the whole history, then resolved to
// parsed transactions in fixed-size batches with a pause between batches. A signature whose lookup
// fails contributes no data; the rest of the fetch continues.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;

use super::classifier::TransferClassifier;
use super::types::{ClassifiedTransfer, TransferKind};
use crate::config::FetcherConfig;
use crate::logger::{self, LogTag};
use crate::rpc::{LedgerClient, ParsedTransaction, RpcResult, SignatureInfo, SignatureQuery};
use crate::utils::{format_address_short, format_signature_short};

// =============================================================================
// FETCH OPTIONS
// =============================================================================

/// Page bounds for one fetch
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides `FetcherConfig::signature_limit`
    pub limit: Option<usize>,
    pub before: Option<String>,
    pub until: Option<String>,
    /// Expected withdrawal recipient, when known
    pub author: Option<String>,
    /// Keep paging back with the `before` cursor until the history ends;
    /// `limit` becomes the page size
    pub all_pages: bool,
}

/// Transfers of one address plus what the signature listing showed
#[derive(Debug, Clone, Default)]
pub struct FetchedHistory {
    /// Oldest first
    pub transfers: Vec<ClassifiedTransfer>,
    /// Oldest signature listed
    pub oldest: Option<SignatureInfo>,
    pub signature_count: usize,
}

// =============================================================================
// CONTRIBUTION FETCHER
// =============================================================================

pub struct ContributionFetcher {
    ledger: Arc<dyn LedgerClient>,
    config: FetcherConfig,
    classifier: TransferClassifier,
}

impl ContributionFetcher {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: FetcherConfig) -> Self {
        let classifier = TransferClassifier::new(config.balance_tolerance_lamports);
        Self {
            ledger,
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Classified, filtered, deduplicated transfers of `address`, oldest first
    ///
    /// Signature listing errors propagate; per-transaction errors do not.
    pub async fn fetch_contributions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> RpcResult<Vec<ClassifiedTransfer>> {
        Ok(self.fetch_history(address, options).await?.transfers)
    }

    /// Like `fetch_contributions`, also reporting the oldest signature seen
    pub async fn fetch_history(&self, address: &str, options: &FetchOptions) -> RpcResult<FetchedHistory> {
        let start_time = Instant::now();
        let signatures = self.list_signatures(address, options).await?;

        if signatures.is_empty() {
            logger::debug(
                LogTag::Fetcher,
                &format!("No signatures found for campaign {}", format_address_short(address)),
            );
            return Ok(FetchedHistory::default());
        }

        let transactions = self.fetch_transactions(&signatures).await;

        let mut transfers = Vec::new();
        for (info, tx) in signatures.iter().zip(transactions) {
            let Some(mut tx) = tx else {
                continue;
            };
            if tx.slot == 0 {
                tx.slot = info.slot;
            }
            transfers.extend(self.classifier.classify(&tx, address));
        }

        let classified = transfers.len();
        let mut transfers = self.filter_transfers(transfers, address, options.author.as_deref());
        transfers = deduplicate(transfers);
        transfers.sort_by_key(|t| t.block_time.unwrap_or(0));

        logger::info(
            LogTag::Fetcher,
            &format!(
                "Campaign {}: {} signatures, {} classified, {} kept in {}ms",
                format_address_short(address),
                signatures.len(),
                classified,
                transfers.len(),
                start_time.elapsed().as_millis()
            ),
        );

        Ok(FetchedHistory {
            transfers,
            signature_count: signatures.len(),
            // Newest first, so the last entry is the oldest
            oldest: signatures.last().cloned(),
        })
    }

    /// Signatures newest first; one page unless `all_pages` is set
    async fn list_signatures(&self, address: &str, options: &FetchOptions) -> RpcResult<Vec<SignatureInfo>> {
        let page_size = options.limit.unwrap_or(self.config.signature_limit).max(1);
        let mut before = options.before.clone();
        let mut signatures: Vec<SignatureInfo> = Vec::new();
        let mut pages = 0usize;

        loop {
            let query = SignatureQuery {
                limit: Some(page_size),
                before: before.clone(),
                until: options.until.clone(),
            };
            let page = self.ledger.get_signatures_for_address(address, query).await?;
            pages += 1;
            let full_page = page.len() >= page_size;
            signatures.extend(page);

            if !options.all_pages || !full_page {
                break;
            }
            let cursor = signatures.last().map(|s| s.signature.clone());
            if cursor.is_none() || cursor == before {
                break;
            }
            before = cursor;
        }

        if pages > 1 {
            logger::debug(
                LogTag::Fetcher,
                &format!(
                    "Campaign {}: {} signatures over {} pages",
                    format_address_short(address),
                    signatures.len(),
                    pages
                ),
            );
        }

        Ok(signatures)
    }

    /// Resolve signatures batch by batch; failures become `None`
    async fn fetch_transactions(&self, signatures: &[SignatureInfo]) -> Vec<Option<ParsedTransaction>> {
        let batch_size = self.config.batch_size.max(1);
        let batch_count = (signatures.len() + batch_size - 1) / batch_size;
        let mut results = Vec::with_capacity(signatures.len());

        for (batch_idx, batch) in signatures.chunks(batch_size).enumerate() {
            let tasks: Vec<_> = batch
                .iter()
                .map(|info| async move {
                    match self.ledger.get_parsed_transaction(&info.signature).await {
                        Ok(tx) => tx,
                        Err(e) => {
                            logger::warning(
                                LogTag::Fetcher,
                                &format!(
                                    "Failed to fetch transaction {}: {}",
                                    format_signature_short(&info.signature),
                                    e
                                ),
                            );
                            None
                        }
                    }
                })
                .collect();

            results.extend(futures::future::join_all(tasks).await);

            logger::debug(
                LogTag::Fetcher,
                &format!(
                    "Resolved batch {}/{} ({} transactions)",
                    batch_idx + 1,
                    batch_count,
                    batch.len()
                ),
            );

            // Delay between batches to avoid rate limiting
            if batch_idx + 1 < batch_count {
                sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
        }

        results
    }

    /// Drop dust and withdrawals that do not leave the campaign account
    fn filter_transfers(
        &self,
        transfers: Vec<ClassifiedTransfer>,
        address: &str,
        author: Option<&str>,
    ) -> Vec<ClassifiedTransfer> {
        transfers
            .into_iter()
            .filter(|t| t.lamports >= self.config.min_amount_lamports)
            .filter(|t| t.kind != TransferKind::Withdrawal || t.from == address)
            .map(|mut t| {
                if self.config.verify_withdrawal_recipient && t.kind == TransferKind::Withdrawal {
                    if let Some(author) = author {
                        if t.to != author {
                            logger::warning(
                                LogTag::Fetcher,
                                &format!(
                                    "Outgoing transfer {} pays {} instead of author {}, not a withdrawal",
                                    format_signature_short(&t.signature),
                                    format_address_short(&t.to),
                                    format_address_short(author)
                                ),
                            );
                            t.kind = TransferKind::Other;
                        }
                    }
                }
                t
            })
            .collect()
    }
}

/// Keep the first transfer per (signature, sender, amount)
pub fn deduplicate(transfers: Vec<ClassifiedTransfer>) -> Vec<ClassifiedTransfer> {
    let mut seen = HashSet::new();
    transfers
        .into_iter()
        .filter(|t| seen.insert(t.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::{MockLedger, TxBuilder};

    const CAMPAIGN: &str = "Campaign1111111111111111111111111111111111";
    const ALICE: &str = "Alice11111111111111111111111111111111111111";
    const BOB: &str = "Bob1111111111111111111111111111111111111111";
    const CAROL: &str = "Carol111111111111111111111111111111111111111";
    const PROGRAM: &str = "9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr";

    fn fast_config() -> FetcherConfig {
        FetcherConfig {
            batch_delay_ms: 0,
            ..FetcherConfig::default()
        }
    }

    fn fetcher(ledger: Arc<MockLedger>) -> ContributionFetcher {
        ContributionFetcher::new(ledger, fast_config())
    }

    #[tokio::test]
    async fn contribution_then_withdrawal_in_time_order() {
        let ledger = Arc::new(MockLedger::new());
        ledger.push_transaction(TxBuilder::new("sig-1", 1_000).transfer(ALICE, CAMPAIGN, 2_000_000).build());
        ledger.push_transaction(
            TxBuilder::new("sig-2", 2_000)
                .inner_transfer(PROGRAM, CAMPAIGN, BOB, 500_000)
                .build(),
        );

        let transfers = fetcher(ledger)
            .fetch_contributions(CAMPAIGN, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].kind, TransferKind::Contribution);
        assert_eq!(transfers[0].lamports, 2_000_000);
        assert_eq!(transfers[0].from, ALICE);
        assert_eq!(transfers[1].kind, TransferKind::Withdrawal);
        assert_eq!(transfers[1].lamports, 500_000);
        assert_eq!(transfers[1].to, BOB);
        assert!(transfers[0].block_time < transfers[1].block_time);
    }

    #[tokio::test]
    async fn all_pages_walks_history_past_the_page_size() {
        let ledger = Arc::new(MockLedger::new());
        for i in 0..25 {
            ledger.push_transaction(
                TxBuilder::new(&format!("sig-{}", i), 100 + i)
                    .transfer(ALICE, CAMPAIGN, 10_000)
                    .build(),
            );
        }
        let fetcher = fetcher(ledger.clone());

        let single = FetchOptions {
            limit: Some(10),
            ..FetchOptions::default()
        };
        let page = fetcher.fetch_history(CAMPAIGN, &single).await.unwrap();
        assert_eq!(page.signature_count, 10);
        assert_eq!(page.oldest.unwrap().signature, "sig-15");

        let requests_before = ledger.signature_requests();
        let every = FetchOptions {
            all_pages: true,
            ..single
        };
        let history = fetcher.fetch_history(CAMPAIGN, &every).await.unwrap();
        assert_eq!(history.signature_count, 25);
        assert_eq!(history.transfers.len(), 25);
        assert_eq!(history.oldest.unwrap().signature, "sig-0");
        assert_eq!(history.transfers[0].signature, "sig-0");
        // 10 + 10 + 5, the short page ends the walk
        assert_eq!(ledger.signature_requests() - requests_before, 3);
    }

    #[tokio::test]
    async fn min_amount_threshold_is_inclusive() {
        let ledger = Arc::new(MockLedger::new());
        ledger.push_transaction(TxBuilder::new("below", 1).transfer(ALICE, CAMPAIGN, 999).build());
        ledger.push_transaction(TxBuilder::new("at", 2).transfer(ALICE, CAMPAIGN, 1_000).build());
        ledger.push_transaction(TxBuilder::new("above", 3).transfer(BOB, CAMPAIGN, 1_001).build());

        let transfers = fetcher(ledger)
            .fetch_contributions(CAMPAIGN, &FetchOptions::default())
            .await
            .unwrap();

        let signatures: Vec<&str> = transfers.iter().map(|t| t.signature.as_str()).collect();
        assert_eq!(signatures, vec!["at", "above"]);
    }

    #[tokio::test]
    async fn refetch_is_idempotent() {
        let ledger = Arc::new(MockLedger::new());
        for i in 0..25 {
            ledger.push_transaction(
                TxBuilder::new(&format!("sig-{}", i), 100 + i)
                    .transfer(ALICE, CAMPAIGN, 10_000 + i as u64)
                    .build(),
            );
        }
        let fetcher = fetcher(ledger.clone());

        let first = fetcher.fetch_contributions(CAMPAIGN, &FetchOptions::default()).await.unwrap();
        let second = fetcher.fetch_contributions(CAMPAIGN, &FetchOptions::default()).await.unwrap();

        assert_eq!(first.len(), 25);
        assert_eq!(first, second);
        // 25 signatures at batch size 10 -> three batches per fetch
        assert_eq!(ledger.transaction_fetches(), 50);
    }

    #[test]
    fn identical_signature_sender_amount_collapse() {
        let structured = ClassifiedTransfer {
            signature: "dup".to_string(),
            slot: 1,
            block_time: Some(1),
            from: ALICE.to_string(),
            to: CAMPAIGN.to_string(),
            lamports: 2_000_000,
            is_inner: false,
            instruction_index: Some(0),
            parent_program: Some("system".to_string()),
            memo: None,
            kind: TransferKind::Contribution,
        };
        let fallback = ClassifiedTransfer {
            instruction_index: None,
            parent_program: None,
            ..structured.clone()
        };

        let kept = deduplicate(vec![structured.clone(), fallback]);
        assert_eq!(kept, vec![structured]);
    }

    #[tokio::test]
    async fn failed_transactions_and_fetch_errors_are_skipped() {
        let ledger = Arc::new(MockLedger::new());
        ledger.push_transaction(
            TxBuilder::new("failed", 1)
                .transfer(ALICE, CAMPAIGN, 2_000_000)
                .failed()
                .build(),
        );
        ledger.push_unreachable_signature(CAMPAIGN, "rate-limited", 2);
        ledger.push_transaction(TxBuilder::new("ok", 3).transfer(BOB, CAMPAIGN, 3_000_000).build());

        let transfers = fetcher(ledger)
            .fetch_contributions(CAMPAIGN, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].signature, "ok");
    }

    #[tokio::test]
    async fn withdrawal_to_non_author_is_reclassified() {
        let ledger = Arc::new(MockLedger::new());
        ledger.push_transaction(
            TxBuilder::new("to-author", 1)
                .inner_transfer(PROGRAM, CAMPAIGN, ALICE, 1_000_000)
                .build(),
        );
        ledger.push_transaction(
            TxBuilder::new("to-stranger", 2)
                .inner_transfer(PROGRAM, CAMPAIGN, CAROL, 1_000_000)
                .build(),
        );

        let options = FetchOptions {
            author: Some(ALICE.to_string()),
            ..FetchOptions::default()
        };
        let transfers = fetcher(ledger)
            .fetch_contributions(CAMPAIGN, &options)
            .await
            .unwrap();

        assert_eq!(transfers[0].kind, TransferKind::Withdrawal);
        assert_eq!(transfers[1].kind, TransferKind::Other);
    }

    #[tokio::test]
    async fn limit_bounds_the_history() {
        let ledger = Arc::new(MockLedger::new());
        for i in 0..5 {
            ledger.push_transaction(
                TxBuilder::new(&format!("s{}", i), 10 + i)
                    .transfer(ALICE, CAMPAIGN, 5_000)
                    .build(),
            );
        }
        let options = FetchOptions {
            limit: Some(2),
            ..FetchOptions::default()
        };
        let transfers = fetcher(ledger)
            .fetch_contributions(CAMPAIGN, &options)
            .await
            .unwrap();

        // Newest two, returned oldest first
        let signatures: Vec<&str> = transfers.iter().map(|t| t.signature.as_str()).collect();
        assert_eq!(signatures, vec!["s3", "s4"]);
    }
}
