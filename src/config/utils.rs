/// Configuration utilities - loading, validation and persistence
///
/// The loaded `Config` is owned by `main` and handed to each service by
/// reference; nothing here keeps a process-wide copy.
use super::schemas::{Config, StoreBackend};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from a TOML file
///
/// A missing file yields the schema defaults. Environment overrides for the
/// session-token service account are applied afterwards, then the result is
/// validated.
pub fn load_config_from_path(path: &str) -> Result<Config, String> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        eprintln!("⚠️  Config file '{}' not found, using default values", path);
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from the default path
pub fn load_config() -> Result<Config, String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Write configuration to disk as pretty TOML, creating parent directories
pub fn save_config(config: &Config, path: &str) -> Result<(), String> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }

    std::fs::write(path, toml_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))
}

/// Apply `FIREBASE_*` environment overrides to the auth section
///
/// The private key may arrive with literal `\n` sequences when passed through
/// a single-line environment variable; those are unescaped.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project_id) = lookup("FIREBASE_PROJECT_ID").filter(|v| !v.is_empty()) {
        config.auth.project_id = project_id;
    }
    if let Some(email) = lookup("FIREBASE_CLIENT_EMAIL").filter(|v| !v.is_empty()) {
        config.auth.client_email = email;
    }
    if let Some(key) = lookup("FIREBASE_PRIVATE_KEY").filter(|v| !v.is_empty()) {
        config.auth.private_key_inline = Some(key.replace("\\n", "\n"));
    }
}

/// Reject values no service can run with
pub fn validate_config(config: &Config) -> Result<(), String> {
    Pubkey::from_str(&config.program.program_id).map_err(|e| {
        format!(
            "Invalid program.program_id '{}': {}",
            config.program.program_id, e
        )
    })?;

    url::Url::parse(&config.rpc.url)
        .map_err(|e| format!("Invalid rpc.url '{}': {}", config.rpc.url, e))?;

    match config.rpc.commitment.as_str() {
        "processed" | "confirmed" | "finalized" => {}
        other => return Err(format!("Invalid rpc.commitment '{}'", other)),
    }

    if config.fetcher.batch_size == 0 {
        return Err("fetcher.batch_size must be at least 1".to_string());
    }
    if config.fetcher.signature_limit == 0 || config.fetcher.signature_limit > 1000 {
        return Err("fetcher.signature_limit must be between 1 and 1000".to_string());
    }
    if config.scanner.signature_limit == 0 || config.scanner.signature_limit > 1000 {
        return Err("scanner.signature_limit must be between 1 and 1000".to_string());
    }
    if config.auth.token_ttl_secs == 0 || config.auth.token_ttl_secs > 3600 {
        return Err("auth.token_ttl_secs must be between 1 and 3600".to_string());
    }
    if config.store.backend == StoreBackend::Sqlite && config.store.path.trim().is_empty() {
        return Err("store.path is required for the sqlite backend".to_string());
    }

    Ok(())
}
