/// Subsystem tags attached to every log line

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Classifier,
    Fetcher,
    Scanner,
    Sync,
    Store,
    Actions,
    Auth,
    Wallet,
    Webserver,
}

impl LogTag {
    /// Key used by `--debug <key>` to enable debug output for this tag
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Rpc => "rpc",
            LogTag::Classifier => "classifier",
            LogTag::Fetcher => "fetcher",
            LogTag::Scanner => "scanner",
            LogTag::Sync => "sync",
            LogTag::Store => "store",
            LogTag::Actions => "actions",
            LogTag::Auth => "auth",
            LogTag::Wallet => "wallet",
            LogTag::Webserver => "webserver",
        }
    }

    /// Uncolored label written to the log file
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }

    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Rpc,
            LogTag::Classifier,
            LogTag::Fetcher,
            LogTag::Scanner,
            LogTag::Sync,
            LogTag::Store,
            LogTag::Actions,
            LogTag::Auth,
            LogTag::Wallet,
            LogTag::Webserver,
        ]
    }
}
