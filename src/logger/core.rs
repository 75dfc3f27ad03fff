/// Core logging implementation with automatic filtering
///
/// Decides whether a message is displayed, then hands it to the formatter.
use super::config::get_logger_config;
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed under the installed config
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();
    let tag_debug = level == LogLevel::Debug && config.debug_tags.contains(tag.to_debug_key());
    level.admitted(config.min_level, tag_debug)
}

/// Internal logging function with automatic filtering
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};

    #[test]
    fn debug_requires_tag_or_threshold() {
        let mut config = LoggerConfig::default();
        config.debug_tags.insert("sync".to_string());
        set_logger_config(config);

        assert!(should_log(&LogTag::Sync, LogLevel::Debug));
        assert!(!should_log(&LogTag::Rpc, LogLevel::Debug));
        assert!(should_log(&LogTag::Rpc, LogLevel::Error));
        assert!(!should_log(&LogTag::Rpc, LogLevel::Verbose));

        set_logger_config(LoggerConfig::default());
    }
}
