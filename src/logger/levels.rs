/// Severity of a log line, ordered from most to least important
///
/// A configured threshold admits every level at or above it in importance;
/// `Debug` additionally opens per tag.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    Verbose,
}

impl LogLevel {
    /// Threshold chosen by the `--verbose` and `--quiet` flags; verbose wins
    pub fn threshold(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => LogLevel::Verbose,
            (false, true) => LogLevel::Warning,
            (false, false) => LogLevel::Info,
        }
    }

    /// Whether a line at this level is printed under `threshold`
    pub fn admitted(self, threshold: LogLevel, tag_debug: bool) -> bool {
        match self {
            LogLevel::Error => true,
            LogLevel::Debug => tag_debug || threshold >= LogLevel::Debug,
            _ => self <= threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "TRACE",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_threshold_hides_info_but_not_warnings() {
        let threshold = LogLevel::threshold(false, true);
        assert!(LogLevel::Warning.admitted(threshold, false));
        assert!(!LogLevel::Info.admitted(threshold, false));
        assert!(LogLevel::Error.admitted(threshold, false));
    }

    #[test]
    fn debug_opens_per_tag_without_verbose() {
        let threshold = LogLevel::threshold(false, false);
        assert!(LogLevel::Debug.admitted(threshold, true));
        assert!(!LogLevel::Debug.admitted(threshold, false));
        assert!(!LogLevel::Verbose.admitted(threshold, true));
        assert!(LogLevel::Verbose.admitted(LogLevel::threshold(true, true), false));
    }
}
