/// Configuration schemas - every section defined once with its defaults
///
/// Each section is declared with `config_struct!`, so a missing field in
/// `config.toml` silently takes the value written here.
use crate::config_struct;
use serde::{Deserialize, Serialize};

// ============================================================================
// LEDGER RPC
// ============================================================================

config_struct! {
    /// Ledger RPC endpoint
    pub struct RpcConfig {
        url: String = "https://api.devnet.solana.com".to_string(),
        /// processed | confirmed | finalized
        commitment: String = "confirmed".to_string(),
        timeout_secs: u64 = 30,
    }
}

// ============================================================================
// CAMPAIGN PROGRAM
// ============================================================================

config_struct! {
    /// On-chain campaign program identity
    pub struct ProgramConfig {
        program_id: String = "9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr".to_string(),
        /// Middle seed of the campaign PDA: [title, seed, author]
        campaign_seed: String = "CAMPAIGN_SEED".to_string(),
    }
}

// ============================================================================
// CONTRIBUTION FETCHER
// ============================================================================

config_struct! {
    /// History fetch and transfer classification
    pub struct FetcherConfig {
        signature_limit: usize = 200,
        batch_size: usize = 10,
        batch_delay_ms: u64 = 100,

        // Noise filtering
        min_amount_lamports: u64 = 1_000,
        balance_tolerance_lamports: u64 = 10_000,

        /// Withdrawals must pay out to the campaign author
        verify_withdrawal_recipient: bool = true,
    }
}

// ============================================================================
// PROGRAM ACCOUNT SCANNER
// ============================================================================

config_struct! {
    pub struct ScannerConfig {
        /// Page size when walking a campaign's full signature history
        signature_limit: usize = 100,
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

config_struct! {
    pub struct SyncConfig {
        apply_campaign_updates: bool = true,
        /// 0 runs a single pass
        interval_secs: u64 = 0,
    }
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

config_struct! {
    pub struct StoreConfig {
        backend: StoreBackend = StoreBackend::Sqlite,
        path: String = "data/fundsu.db".to_string(),
    }
}

// ============================================================================
// WEBSERVER
// ============================================================================

config_struct! {
    pub struct WebserverConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,
        /// Empty allows any origin
        allowed_origins: Vec<String> = Vec::new(),
    }
}

// ============================================================================
// SESSION TOKENS
// ============================================================================

config_struct! {
    /// Service account used to mint custom session tokens
    pub struct AuthConfig {
        project_id: String = String::new(),
        client_email: String = String::new(),
        /// PEM file holding the service account private key
        private_key_path: String = String::new(),
        /// PEM text, takes precedence over `private_key_path`
        #[serde(skip_serializing_if = "Option::is_none")]
        private_key_inline: Option<String> = None,
        token_ttl_secs: u64 = 3600,
    }
}

// ============================================================================
// WALLET
// ============================================================================

config_struct! {
    pub struct WalletConfig {
        backup_path: String = "data/wallet-backup.json".to_string(),
    }
}

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration, one field per TOML section
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        program: ProgramConfig = ProgramConfig::default(),
        fetcher: FetcherConfig = FetcherConfig::default(),
        scanner: ScannerConfig = ScannerConfig::default(),
        sync: SyncConfig = SyncConfig::default(),
        store: StoreConfig = StoreConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
        auth: AuthConfig = AuthConfig::default(),
        wallet: WalletConfig = WalletConfig::default(),
    }
}
