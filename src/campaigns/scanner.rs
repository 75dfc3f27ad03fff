// Program account scanner
//
// Enumerates the program's accounts, decodes them, and pairs every campaign
// with its transfer history and creation transaction.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde::Serialize;

use super::accounts::{group_accounts, CampaignAccount};
use crate::config::{FetcherConfig, ProgramConfig, ScannerConfig};
use crate::logger::{self, LogTag};
use crate::rpc::{LedgerClient, RpcResult};
use crate::store::Campaign;
use crate::transactions::{ClassifiedTransfer, ContributionFetcher, FetchOptions, TransferKind};
use crate::utils::{format_address_short, unix_now};

/// Decoded on-chain campaign with its history
#[derive(Debug, Clone, Serialize)]
pub struct CampaignWithHistory {
    pub campaign: Campaign,
    /// Oldest first
    pub transfers: Vec<ClassifiedTransfer>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub campaigns: Vec<CampaignWithHistory>,
    /// Accounts per type name, `unknown` included
    pub account_counts: BTreeMap<String, usize>,
}

pub struct ProgramScanner {
    ledger: Arc<dyn LedgerClient>,
    fetcher: ContributionFetcher,
    program_id: String,
    config: ScannerConfig,
}

impl ProgramScanner {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        program: &ProgramConfig,
        config: ScannerConfig,
        fetcher_config: FetcherConfig,
    ) -> Self {
        Self {
            fetcher: ContributionFetcher::new(ledger.clone(), fetcher_config),
            ledger,
            program_id: program.program_id.clone(),
            config,
        }
    }

    /// Every campaign owned by the program
    ///
    /// Campaigns are processed concurrently; the first RPC error aborts the
    /// scan.
    pub async fn scan(&self) -> RpcResult<ScanResult> {
        let start_time = Instant::now();
        let accounts = self.ledger.get_program_accounts(&self.program_id).await?;
        let grouped = group_accounts(&accounts);

        logger::info(
            LogTag::Scanner,
            &format!(
                "Program {} owns {} accounts ({} unrecognised)",
                format_address_short(&self.program_id),
                accounts.len(),
                grouped.unknown.len()
            ),
        );

        let campaigns = try_join_all(
            grouped
                .campaigns()
                .map(|(address, account)| self.load_campaign(address, account)),
        )
        .await?;

        logger::info(
            LogTag::Scanner,
            &format!(
                "Scanned {} campaigns in {}ms",
                campaigns.len(),
                start_time.elapsed().as_millis()
            ),
        );

        Ok(ScanResult {
            campaigns,
            account_counts: grouped.counts(),
        })
    }

    async fn load_campaign(
        &self,
        address: &str,
        account: &CampaignAccount,
    ) -> RpcResult<CampaignWithHistory> {
        let author = account.author().to_string();
        // Full history: contributor count and creation tx both need the oldest page
        let history = self
            .fetcher
            .fetch_history(
                address,
                &FetchOptions {
                    limit: Some(self.config.signature_limit),
                    author: Some(author),
                    all_pages: true,
                    ..FetchOptions::default()
                },
            )
            .await?;
        let creation = history.oldest.as_ref();
        let transfers = history.transfers;

        let campaign = campaign_from_account(
            address,
            account,
            &transfers,
            creation.map(|s| s.signature.as_str()).unwrap_or_default(),
            creation.and_then(|s| s.block_time).unwrap_or_else(unix_now),
        );

        logger::debug(
            LogTag::Scanner,
            &format!(
                "Campaign {} '{}': {} transfers, closed={}",
                format_address_short(address),
                campaign.title,
                transfers.len(),
                campaign.closed
            ),
        );

        Ok(CampaignWithHistory {
            campaign,
            transfers,
        })
    }
}

/// Mirror document for an on-chain campaign
///
/// `locked` is the account's own flag, cleared once a withdrawal closed the
/// campaign. Fields that exist only off-chain take their blank defaults.
pub fn campaign_from_account(
    address: &str,
    account: &CampaignAccount,
    transfers: &[ClassifiedTransfer],
    tx_hash: &str,
    timestamp: i64,
) -> Campaign {
    let closed = transfers.iter().any(|t| t.kind == TransferKind::Withdrawal);
    let contributors_count = transfers
        .iter()
        .filter(|t| t.kind == TransferKind::Contribution)
        .count() as u64;

    Campaign {
        id: address.to_string(),
        campaign_wallet_key: address.to_string(),
        author: account.author().to_string(),
        title: account.title.clone(),
        description: account.description.clone(),
        target_amount: account.target_amount,
        current_amount: account.current_amount,
        locked: account.locked && !closed,
        likes: account.likes,
        dislikes: account.dislikes,
        closed,
        timestamp,
        contributors_count,
        tx_hash: tx_hash.to_string(),
        ..Campaign::default()
    }
}
