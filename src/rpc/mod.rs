//! Ledger RPC
//!
//! `LedgerClient` is the only way the indexer talks to the chain. The
//! production implementation wraps the nonblocking Solana RPC client; tests
//! script one in memory.

pub mod client;
pub mod convert;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use client::SolanaLedgerClient;
pub use types::{
    InnerInstructionBlock, InstructionKind, ParsedInstruction, ParsedTransaction, ProgramAccount,
    RpcError, RpcResult, SignatureInfo, SignatureQuery,
};

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Keypair;

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Newest-first signatures touching `address`
    async fn get_signatures_for_address(
        &self,
        address: &str,
        query: SignatureQuery,
    ) -> RpcResult<Vec<SignatureInfo>>;

    /// Parsed transaction with metadata, `None` when the node has no record
    async fn get_parsed_transaction(&self, signature: &str) -> RpcResult<Option<ParsedTransaction>>;

    async fn get_program_accounts(&self, program_id: &str) -> RpcResult<Vec<ProgramAccount>>;

    async fn get_balance(&self, address: &str) -> RpcResult<u64>;

    /// Sign with `signer` as fee payer, submit and confirm
    ///
    /// A program rejection comes back as `RpcError::ProgramFailed` carrying
    /// the simulation logs.
    async fn send_instructions(
        &self,
        instructions: Vec<Instruction>,
        signer: &Keypair,
    ) -> RpcResult<String>;
}
