use crate::errors::ProgramFailure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum RpcError {
    ConnectionFailed(String),
    Timeout,
    InvalidResponse(String),
    InvalidAddress(String),
    RequestFailed(String),
    /// The program rejected the submitted instructions
    ProgramFailed(ProgramFailure),
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RpcError::Timeout => write!(f, "Request timeout"),
            RpcError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            RpcError::InvalidAddress(addr) => write!(f, "Invalid address: {}", addr),
            RpcError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            RpcError::ProgramFailed(failure) => {
                write!(f, "Program call failed: {}", failure.message)
            }
        }
    }
}

impl std::error::Error for RpcError {}

pub type RpcResult<T> = Result<T, RpcError>;

/// Bounds for a getSignaturesForAddress page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureQuery {
    pub limit: Option<usize>,
    /// Start searching backwards from this signature
    pub before: Option<String>,
    /// Stop once this signature is reached
    pub until: Option<String>,
}

impl SignatureQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Information about a transaction signature from getSignaturesForAddress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Error if the transaction failed, None if successful
    pub err: Option<String>,
    pub memo: Option<String>,
    /// Block time as Unix timestamp
    pub block_time: Option<i64>,
}

/// What a parsed instruction does, as far as classification cares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Native value transfer (system program `transfer` / `transferWithSeed`)
    Transfer {
        source: String,
        destination: String,
        lamports: u64,
    },
    /// Memo program payload
    Memo(String),
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInstruction {
    /// Parser name reported by the node ("system", "spl-memo"), if any
    pub program: Option<String>,
    pub program_id: String,
    pub kind: InstructionKind,
}

impl ParsedInstruction {
    /// Parser name when known, otherwise the program id
    pub fn program_label(&self) -> &str {
        self.program.as_deref().unwrap_or(&self.program_id)
    }
}

/// Instructions executed by CPI under one top-level instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerInstructionBlock {
    /// Index of the enclosing top-level instruction
    pub index: usize,
    pub instructions: Vec<ParsedInstruction>,
}

/// Ledger transaction with execution metadata, reduced to what the
/// classifier reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub account_keys: Vec<String>,
    pub instructions: Vec<ParsedInstruction>,
    pub inner_instructions: Vec<InnerInstructionBlock>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    /// Execution error, if the transaction failed
    pub err: Option<String>,
    pub log_messages: Vec<String>,
}

impl ParsedTransaction {
    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }

    /// Index of `address` among the account keys
    pub fn account_index(&self, address: &str) -> Option<usize> {
        self.account_keys.iter().position(|key| key == address)
    }

    /// Signed lamport change of the account at `index`
    pub fn balance_delta(&self, index: usize) -> Option<i128> {
        let pre = *self.pre_balances.get(index)?;
        let post = *self.post_balances.get(index)?;
        Some(post as i128 - pre as i128)
    }
}

/// Account owned by a program, raw data included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAccount {
    pub pubkey: String,
    pub owner: String,
    pub lamports: u64,
    pub data: Vec<u8>,
}
