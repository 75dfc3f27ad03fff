/// Structured error handling for the FundsU indexer
///
/// Every fallible async operation surfaces one of these to its caller; there is
/// no central error bus. Leaf decode errors live next to their decoders.
pub mod program;

pub use program::{ProgramError, ProgramFailure};

use crate::rpc::RpcError;

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Debug, Clone)]
pub enum FundsuError {
    // Network connectivity errors
    Network(NetworkError),

    // Ledger RPC errors
    Rpc(RpcError),

    // Document store read/write errors
    Store(StoreError),

    // Data parsing & decoding errors
    Data(DataError),

    // Configuration errors
    Configuration(ConfigurationError),

    // Structured on-chain program failures
    Program(ProgramError),

    // Input rejected before any network call
    Validation(ValidationError),
}

impl std::fmt::Display for FundsuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundsuError::Network(e) => write!(f, "Network Error: {}", e),
            FundsuError::Rpc(e) => write!(f, "RPC Error: {}", e),
            FundsuError::Store(e) => write!(f, "Store Error: {}", e),
            FundsuError::Data(e) => write!(f, "Data Error: {}", e),
            FundsuError::Configuration(e) => write!(f, "Configuration Error: {}", e),
            FundsuError::Program(e) => write!(f, "{}", e),
            FundsuError::Validation(e) => write!(f, "Validation Error: {}", e),
        }
    }
}

impl std::error::Error for FundsuError {}

pub type FundsuResult<T> = Result<T, FundsuError>;

// =============================================================================
// NETWORK ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum NetworkError {
    ConnectionTimeout { endpoint: String, timeout_ms: u64 },
    HttpStatusError { endpoint: String, status: u16 },
    Generic { message: String },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ConnectionTimeout {
                endpoint,
                timeout_ms,
            } => write!(f, "Connection timeout to {} after {}ms", endpoint, timeout_ms),
            NetworkError::HttpStatusError { endpoint, status } => {
                write!(f, "HTTP {} from {}", status, endpoint)
            }
            NetworkError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// STORE ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum StoreError {
    ReadFailed { collection: String, reason: String },
    WriteFailed { reason: String },
    NotFound { collection: String, id: String },
    Corrupt { collection: String, id: String, reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ReadFailed { collection, reason } => {
                write!(f, "Failed to read '{}': {}", collection, reason)
            }
            StoreError::WriteFailed { reason } => write!(f, "Batch write failed: {}", reason),
            StoreError::NotFound { collection, id } => {
                write!(f, "Document '{}' not found in '{}'", id, collection)
            }
            StoreError::Corrupt {
                collection,
                id,
                reason,
            } => write!(f, "Corrupt document '{}' in '{}': {}", id, collection, reason),
        }
    }
}

// =============================================================================
// DATA ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum DataError {
    ParseError { data_type: String, error: String },
    InvalidAddress { address: String, error: String },
    Generic { message: String },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::ParseError { data_type, error } => {
                write!(f, "Failed to parse {}: {}", data_type, error)
            }
            DataError::InvalidAddress { address, error } => {
                write!(f, "Invalid address '{}': {}", address, error)
            }
            DataError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// CONFIGURATION ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum ConfigurationError {
    InvalidConfig { field: String, reason: String },
    MissingConfig { field: String },
    Generic { message: String },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::InvalidConfig { field, reason } => {
                write!(f, "Invalid config field '{}': {}", field, reason)
            }
            ConfigurationError::MissingConfig { field } => {
                write!(f, "Missing config field '{}'", field)
            }
            ConfigurationError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// VALIDATION ERROR TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidSeedPhrase { reason: String },
    InvalidImageUrl { url: String },
    InsufficientBalance { required: u64, available: u64 },
    InvalidAmount { reason: String },
    InvalidField { field: String, reason: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidSeedPhrase { reason } => {
                write!(f, "Invalid seed phrase: {}", reason)
            }
            ValidationError::InvalidImageUrl { url } => write!(f, "Invalid image URL: {}", url),
            ValidationError::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "Insufficient balance: {} lamports required, {} available",
                required, available
            ),
            ValidationError::InvalidAmount { reason } => write!(f, "Invalid amount: {}", reason),
            ValidationError::InvalidField { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<RpcError> for FundsuError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::ProgramFailed(failure) => {
                FundsuError::Program(ProgramError::from_failure(&failure))
            }
            other => FundsuError::Rpc(other),
        }
    }
}

impl From<solana_client::client_error::ClientError> for FundsuError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        crate::rpc::client::map_client_error(err).into()
    }
}

impl From<ValidationError> for FundsuError {
    fn from(err: ValidationError) -> Self {
        FundsuError::Validation(err)
    }
}

impl From<ProgramError> for FundsuError {
    fn from(err: ProgramError) -> Self {
        FundsuError::Program(err)
    }
}

impl From<rusqlite::Error> for FundsuError {
    fn from(err: rusqlite::Error) -> Self {
        FundsuError::Store(StoreError::WriteFailed {
            reason: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for FundsuError {
    fn from(err: serde_json::Error) -> Self {
        FundsuError::Data(DataError::ParseError {
            data_type: "JSON".to_string(),
            error: err.to_string(),
        })
    }
}

impl From<std::io::Error> for FundsuError {
    fn from(err: std::io::Error) -> Self {
        FundsuError::Data(DataError::Generic {
            message: format!("I/O error: {}", err),
        })
    }
}

// =============================================================================
// STRUCTURED ERROR BUILDERS
// =============================================================================

impl FundsuError {
    pub fn store_read(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        FundsuError::Store(StoreError::ReadFailed {
            collection: collection.into(),
            reason: reason.into(),
        })
    }

    pub fn store_write(reason: impl Into<String>) -> Self {
        FundsuError::Store(StoreError::WriteFailed {
            reason: reason.into(),
        })
    }

    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        FundsuError::Store(StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        })
    }

    pub fn invalid_address(address: impl Into<String>, error: impl std::fmt::Display) -> Self {
        FundsuError::Data(DataError::InvalidAddress {
            address: address.into(),
            error: error.to_string(),
        })
    }

    pub fn parse_error(data_type: impl Into<String>, error: impl std::fmt::Display) -> Self {
        FundsuError::Data(DataError::ParseError {
            data_type: data_type.into(),
            error: error.to_string(),
        })
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        FundsuError::Configuration(ConfigurationError::Generic {
            message: message.into(),
        })
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        FundsuError::Network(NetworkError::Generic {
            message: message.into(),
        })
    }

    /// Message suitable for an end-user alert
    ///
    /// Program failures already carry a human-readable text; everything else
    /// falls back to its display form.
    pub fn user_message(&self) -> String {
        match self {
            FundsuError::Program(e) => e.user_message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_failures_become_program_errors() {
        let err: FundsuError = RpcError::ProgramFailed(ProgramFailure::new("x").with_code(6004)).into();
        match &err {
            FundsuError::Program(program) => {
                assert_eq!(program.name.as_deref(), Some("CampaignClosed"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.user_message(), "Campaign is already closed");
    }

    #[test]
    fn other_rpc_errors_stay_rpc() {
        let err: FundsuError = RpcError::Timeout.into();
        assert!(matches!(err, FundsuError::Rpc(RpcError::Timeout)));
    }
}
