/// Runtime logger configuration
///
/// Built from CLI flags in `main` and installed once via `logger::init`.
use super::levels::LogLevel;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that is printed (Debug additionally needs a debug tag)
    pub min_level: LogLevel,
    /// Tags with debug output enabled (`to_debug_key` values)
    pub debug_tags: HashSet<String>,
    /// Mirror log lines into the log file
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            file_logging: true,
        }
    }
}

impl LoggerConfig {
    /// Build a configuration from the CLI logging flags
    pub fn from_flags(debug_tags: &[String], verbose: bool, quiet: bool) -> Self {
        Self {
            min_level: LogLevel::threshold(verbose, quiet),
            debug_tags: debug_tags.iter().map(|t| t.trim().to_lowercase()).collect(),
            file_logging: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn set_logger_config(config: LoggerConfig) {
    match LOGGER_CONFIG.write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}
