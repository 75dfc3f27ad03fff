use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::logger::{self, LogTag};
use crate::transactions::{aggregate, ClassifiedTransfer, ContributionStats, FetchOptions, TransferKind};
use crate::webserver::{
    state::AppState,
    utils::{error_response, success_response},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatsResponse {
    pub address: String,
    pub stats: ContributionStats,
    pub transfers: Vec<ClassifiedTransfer>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/campaigns/:address/stats", get(campaign_stats))
}

/// GET /api/campaigns/:address/stats
async fn campaign_stats(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    // The mirror knows the author when the campaign has been synced
    let author = match state.store.campaign(&address).await {
        Ok(campaign) => campaign.map(|c| c.author),
        Err(e) => {
            logger::warning(LogTag::Webserver, &format!("Campaign lookup failed: {}", e));
            None
        }
    };

    let options = FetchOptions {
        author,
        ..FetchOptions::default()
    };
    match state.fetcher.fetch_contributions(&address, &options).await {
        Ok(transfers) => {
            let contributions: Vec<ClassifiedTransfer> = transfers
                .iter()
                .filter(|t| t.kind == TransferKind::Contribution)
                .cloned()
                .collect();
            success_response(CampaignStatsResponse {
                stats: aggregate(&contributions),
                address,
                transfers,
            })
        }
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Failed to fetch contributions for {}: {}", address, e),
            );
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}
