//! Structured logging for the FundsU indexer
//!
//! Tag-based logger with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via `--debug <tag>`
//! - Dual output: colored console + file persistence
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fundsu::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "Connection failed");
//! logger::info(LogTag::Sync, "Sync pass complete");
//! logger::debug(LogTag::Fetcher, "Batch 2/5 resolved"); // Only with --debug fetcher
//! logger::verbose(LogTag::Classifier, "Raw instruction: ..."); // Only with --verbose
//! ```
//!
//! Call [`init`] once at startup before any logging occurs. Without it, messages
//! still reach the console using the default configuration.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

use std::path::Path;

/// Initialize the logger system
///
/// Installs the given configuration and opens the log file inside `log_dir`.
/// File logging is best-effort: if the directory cannot be created the
/// logger keeps writing to the console only.
pub fn init(config: LoggerConfig, log_dir: &Path) {
    set_logger_config(config);
    file::init_file_logging(log_dir);
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARN level (important issues)
///
/// Shown by default and still shown with `--quiet`.
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Debug logs are ONLY shown when the tag was enabled with `--debug <tag>`.
///
/// # Example
/// ```rust,ignore
/// // Only shown with --debug sync
/// logger::debug(LogTag::Sync, "Planned 3 campaign creates");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at TRACE level, printed only with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
