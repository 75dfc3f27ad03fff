/// Shared application state for the webserver
///
/// Every service is built once from the loaded configuration and shared by
/// reference with the route handlers.
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::TokenIssuer;
use crate::campaigns::ProgramScanner;
use crate::config::Config;
use crate::rpc::LedgerClient;
use crate::store::DocumentStore;
use crate::sync::ReconciliationSync;
use crate::transactions::ContributionFetcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub fetcher: Arc<ContributionFetcher>,
    pub sync: Arc<ReconciliationSync>,
    pub token_issuer: Arc<TokenIssuer>,
    /// Held for the duration of a manual sync so passes never overlap
    pub sync_guard: Arc<Mutex<()>>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        config: Config,
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn DocumentStore>,
        token_issuer: TokenIssuer,
    ) -> Self {
        let scanner = ProgramScanner::new(
            ledger.clone(),
            &config.program,
            config.scanner.clone(),
            config.fetcher.clone(),
        );
        let sync = ReconciliationSync::new(scanner, store.clone(), config.sync.clone());
        let fetcher = ContributionFetcher::new(ledger, config.fetcher.clone());

        Self {
            config: Arc::new(config),
            store,
            fetcher: Arc::new(fetcher),
            sync: Arc::new(sync),
            token_issuer: Arc::new(token_issuer),
            sync_guard: Arc::new(Mutex::new(())),
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
