//! Scripted in-memory `LedgerClient` for tests

use super::types::{
    InnerInstructionBlock, InstructionKind, ParsedInstruction, ParsedTransaction, ProgramAccount,
    RpcError, RpcResult, SignatureInfo, SignatureQuery,
};
use super::LedgerClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";
const STARTING_BALANCE: u64 = 1_000_000_000;

#[derive(Default)]
pub struct MockLedger {
    /// Newest first, per address
    signatures: Mutex<HashMap<String, Vec<SignatureInfo>>>,
    transactions: Mutex<HashMap<String, ParsedTransaction>>,
    failing: Mutex<HashSet<String>>,
    accounts: Mutex<Vec<ProgramAccount>>,
    balances: Mutex<HashMap<String, u64>>,
    sent: Mutex<Vec<(String, Vec<Instruction>)>>,
    next_send_error: Mutex<Option<RpcError>>,
    transaction_fetches: AtomicUsize,
    signature_requests: AtomicUsize,
    send_counter: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tx` in the history of every account it touches
    pub fn push_transaction(&self, tx: ParsedTransaction) {
        let info = SignatureInfo {
            signature: tx.signature.clone(),
            slot: tx.slot,
            err: tx.err.clone(),
            memo: None,
            block_time: tx.block_time,
        };
        {
            let mut signatures = self.signatures.lock();
            for key in &tx.account_keys {
                signatures.entry(key.clone()).or_default().insert(0, info.clone());
            }
        }
        self.transactions.lock().insert(tx.signature.clone(), tx);
    }

    /// Signature listed for `address` but `getTransaction` errors
    pub fn push_unreachable_signature(&self, address: &str, signature: &str, slot: u64) {
        self.signatures
            .lock()
            .entry(address.to_string())
            .or_default()
            .insert(
                0,
                SignatureInfo {
                    signature: signature.to_string(),
                    slot,
                    err: None,
                    memo: None,
                    block_time: Some(slot as i64),
                },
            );
        self.failing.lock().insert(signature.to_string());
    }

    /// Add `account`, replacing any account with the same pubkey
    pub fn push_account(&self, account: ProgramAccount) {
        let mut accounts = self.accounts.lock();
        accounts.retain(|existing| existing.pubkey != account.pubkey);
        accounts.push(account);
    }

    pub fn set_balance(&self, address: &str, lamports: u64) {
        self.balances.lock().insert(address.to_string(), lamports);
    }

    pub fn fail_next_send(&self, error: RpcError) {
        *self.next_send_error.lock() = Some(error);
    }

    pub fn sent(&self) -> Vec<(String, Vec<Instruction>)> {
        self.sent.lock().clone()
    }

    pub fn transaction_fetches(&self) -> usize {
        self.transaction_fetches.load(Ordering::SeqCst)
    }

    pub fn signature_requests(&self) -> usize {
        self.signature_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        query: SignatureQuery,
    ) -> RpcResult<Vec<SignatureInfo>> {
        self.signature_requests.fetch_add(1, Ordering::SeqCst);
        let all = self
            .signatures
            .lock()
            .get(address)
            .cloned()
            .unwrap_or_default();

        let start = match &query.before {
            Some(before) => all
                .iter()
                .position(|s| &s.signature == before)
                .map(|i| i + 1)
                .unwrap_or(all.len()),
            None => 0,
        };

        let mut page = Vec::new();
        for info in all.into_iter().skip(start) {
            if query.until.as_deref() == Some(info.signature.as_str()) {
                break;
            }
            if query.limit.map_or(false, |limit| page.len() >= limit) {
                break;
            }
            page.push(info);
        }
        Ok(page)
    }

    async fn get_parsed_transaction(&self, signature: &str) -> RpcResult<Option<ParsedTransaction>> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(signature) {
            return Err(RpcError::RequestFailed(format!("429 Too Many Requests for {}", signature)));
        }
        Ok(self.transactions.lock().get(signature).cloned())
    }

    async fn get_program_accounts(&self, program_id: &str) -> RpcResult<Vec<ProgramAccount>> {
        Ok(self
            .accounts
            .lock()
            .iter()
            .filter(|account| account.owner == program_id)
            .cloned()
            .collect())
    }

    async fn get_balance(&self, address: &str) -> RpcResult<u64> {
        Ok(self.balances.lock().get(address).copied().unwrap_or(0))
    }

    async fn send_instructions(
        &self,
        instructions: Vec<Instruction>,
        signer: &Keypair,
    ) -> RpcResult<String> {
        if let Some(error) = self.next_send_error.lock().take() {
            return Err(error);
        }
        let n = self.send_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let signature = format!("mock-sig-{}", n);
        self.sent.lock().push((signer.pubkey().to_string(), instructions));
        Ok(signature)
    }
}

/// Builds `ParsedTransaction`s with balances consistent with their transfers
pub struct TxBuilder {
    tx: ParsedTransaction,
}

impl TxBuilder {
    pub fn new(signature: &str, block_time: i64) -> Self {
        Self {
            tx: ParsedTransaction {
                signature: signature.to_string(),
                slot: block_time as u64,
                block_time: Some(block_time),
                account_keys: Vec::new(),
                instructions: Vec::new(),
                inner_instructions: Vec::new(),
                pre_balances: Vec::new(),
                post_balances: Vec::new(),
                err: None,
                log_messages: Vec::new(),
            },
        }
    }

    fn key_index(&mut self, address: &str) -> usize {
        if let Some(index) = self.tx.account_index(address) {
            return index;
        }
        self.tx.account_keys.push(address.to_string());
        self.tx.pre_balances.push(STARTING_BALANCE);
        self.tx.post_balances.push(STARTING_BALANCE);
        self.tx.account_keys.len() - 1
    }

    /// Adjust only the post balance of `address`
    pub fn balance_change(mut self, address: &str, delta: i64) -> Self {
        let index = self.key_index(address);
        let post = self.tx.post_balances[index] as i64 + delta;
        self.tx.post_balances[index] = post.max(0) as u64;
        self
    }

    fn move_lamports(self, source: &str, destination: &str, lamports: u64) -> Self {
        self.balance_change(source, -(lamports as i64))
            .balance_change(destination, lamports as i64)
    }

    fn transfer_ix(source: &str, destination: &str, lamports: u64) -> ParsedInstruction {
        ParsedInstruction {
            program: Some("system".to_string()),
            program_id: SYSTEM_PROGRAM_ID.to_string(),
            kind: InstructionKind::Transfer {
                source: source.to_string(),
                destination: destination.to_string(),
                lamports,
            },
        }
    }

    pub fn transfer(mut self, source: &str, destination: &str, lamports: u64) -> Self {
        self.key_index(SYSTEM_PROGRAM_ID);
        self.tx
            .instructions
            .push(Self::transfer_ix(source, destination, lamports));
        self.move_lamports(source, destination, lamports)
    }

    /// Top-level call into `program_id` that moves funds by CPI
    pub fn inner_transfer(
        mut self,
        program_id: &str,
        source: &str,
        destination: &str,
        lamports: u64,
    ) -> Self {
        self.key_index(program_id);
        self.tx.instructions.push(ParsedInstruction {
            program: None,
            program_id: program_id.to_string(),
            kind: InstructionKind::Other,
        });
        let index = self.tx.instructions.len() - 1;
        self.tx.inner_instructions.push(InnerInstructionBlock {
            index,
            instructions: vec![Self::transfer_ix(source, destination, lamports)],
        });
        self.move_lamports(source, destination, lamports)
    }

    /// Program call whose fund movement shows only in balances
    pub fn opaque_call(mut self, program_id: &str, touched: &[&str]) -> Self {
        self.key_index(program_id);
        for address in touched {
            self.key_index(address);
        }
        self.tx.instructions.push(ParsedInstruction {
            program: None,
            program_id: program_id.to_string(),
            kind: InstructionKind::Other,
        });
        self
    }

    pub fn memo(mut self, text: &str) -> Self {
        self.tx.instructions.push(ParsedInstruction {
            program: Some("spl-memo".to_string()),
            program_id: MEMO_PROGRAM_ID.to_string(),
            kind: InstructionKind::Memo(text.to_string()),
        });
        self
    }

    pub fn failed(mut self) -> Self {
        self.tx.err = Some("InstructionError(0, Custom(1))".to_string());
        self
    }

    pub fn build(self) -> ParsedTransaction {
        self.tx
    }
}
