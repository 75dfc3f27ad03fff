//! Solana-backed `LedgerClient`

use super::convert::{parsed_transaction_from_encoded, signature_info_from_status};
use super::types::{ParsedTransaction, ProgramAccount, RpcError, RpcResult, SignatureInfo, SignatureQuery};
use super::LedgerClient;
use crate::config::RpcConfig;
use crate::errors::ProgramFailure;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_request::{RpcError as ClientRpcError, RpcRequest, RpcResponseErrorData};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{Instruction, InstructionError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::str::FromStr;
use std::time::Duration;

pub struct SolanaLedgerClient {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaLedgerClient {
    pub fn new(config: &RpcConfig) -> Self {
        let commitment = commitment_from_str(&config.commitment);
        let client = RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            commitment,
        );
        Self { client, commitment }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

fn commitment_from_str(value: &str) -> CommitmentConfig {
    match value {
        "processed" => CommitmentConfig::processed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::confirmed(),
    }
}

fn parse_pubkey(address: &str) -> RpcResult<Pubkey> {
    Pubkey::from_str(address).map_err(|_| RpcError::InvalidAddress(address.to_string()))
}

fn parse_signature(signature: &str) -> RpcResult<Signature> {
    Signature::from_str(signature)
        .map_err(|e| RpcError::InvalidResponse(format!("invalid signature '{}': {}", signature, e)))
}

/// Map a client error onto the crate's RPC taxonomy
pub fn map_client_error(err: ClientError) -> RpcError {
    if let Some(failure) = program_failure(&err) {
        return RpcError::ProgramFailed(failure);
    }

    match err.kind() {
        ClientErrorKind::Io(e) => RpcError::ConnectionFailed(e.to_string()),
        ClientErrorKind::Reqwest(e) if e.is_timeout() => RpcError::Timeout,
        ClientErrorKind::Reqwest(e) if e.is_connect() => RpcError::ConnectionFailed(e.to_string()),
        ClientErrorKind::SerdeJson(e) => RpcError::InvalidResponse(e.to_string()),
        _ => RpcError::RequestFailed(err.to_string()),
    }
}

/// Extract the custom code and simulation logs of a rejected submission
fn program_failure(err: &ClientError) -> Option<ProgramFailure> {
    let logs = match err.kind() {
        ClientErrorKind::RpcError(ClientRpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.clone().unwrap_or_default(),
        _ => Vec::new(),
    };

    let tx_error = err.get_transaction_error();
    if tx_error.is_none() && logs.is_empty() {
        return None;
    }

    let code = match &tx_error {
        Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) => Some(*code),
        _ => None,
    };

    let mut failure = ProgramFailure::new(err.to_string()).with_logs(logs);
    failure.code = code;
    Some(failure)
}

#[async_trait]
impl LedgerClient for SolanaLedgerClient {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        query: SignatureQuery,
    ) -> RpcResult<Vec<SignatureInfo>> {
        let pubkey = parse_pubkey(address)?;
        let config = GetConfirmedSignaturesForAddress2Config {
            before: query.before.as_deref().map(parse_signature).transpose()?,
            until: query.until.as_deref().map(parse_signature).transpose()?,
            limit: query.limit,
            commitment: Some(self.commitment),
        };

        let statuses = self
            .client
            .get_signatures_for_address_with_config(&pubkey, config)
            .await
            .map_err(map_client_error)?;

        logger::verbose(
            LogTag::Rpc,
            &format!("getSignaturesForAddress {} -> {} entries", address, statuses.len()),
        );

        Ok(statuses.into_iter().map(signature_info_from_status).collect())
    }

    async fn get_parsed_transaction(&self, signature: &str) -> RpcResult<Option<ParsedTransaction>> {
        let params = serde_json::json!([
            signature,
            {
                "encoding": UiTransactionEncoding::JsonParsed,
                "commitment": self.commitment.commitment,
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let value: serde_json::Value = self
            .client
            .send(RpcRequest::GetTransaction, params)
            .await
            .map_err(map_client_error)?;

        if value.is_null() {
            return Ok(None);
        }

        let encoded: EncodedConfirmedTransactionWithStatusMeta = serde_json::from_value(value)
            .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse transaction: {}", e)))?;

        Ok(parsed_transaction_from_encoded(signature, encoded))
    }

    async fn get_program_accounts(&self, program_id: &str) -> RpcResult<Vec<ProgramAccount>> {
        let program = parse_pubkey(program_id)?;
        let accounts = self
            .client
            .get_program_accounts(&program)
            .await
            .map_err(map_client_error)?;

        logger::debug(
            LogTag::Rpc,
            &format!("getProgramAccounts {} -> {} accounts", program_id, accounts.len()),
        );

        Ok(accounts
            .into_iter()
            .map(|(pubkey, account)| ProgramAccount {
                pubkey: pubkey.to_string(),
                owner: account.owner.to_string(),
                lamports: account.lamports,
                data: account.data,
            })
            .collect())
    }

    async fn get_balance(&self, address: &str) -> RpcResult<u64> {
        let pubkey = parse_pubkey(address)?;
        self.client.get_balance(&pubkey).await.map_err(map_client_error)
    }

    async fn send_instructions(
        &self,
        instructions: Vec<Instruction>,
        signer: &Keypair,
    ) -> RpcResult<String> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(map_client_error)?;

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&signer.pubkey()),
            &[signer],
            blockhash,
        );

        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(map_client_error)?;

        logger::info(LogTag::Rpc, &format!("Transaction confirmed: {}", signature));
        Ok(signature.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_parsing_defaults_to_confirmed() {
        assert_eq!(commitment_from_str("finalized"), CommitmentConfig::finalized());
        assert_eq!(commitment_from_str("processed"), CommitmentConfig::processed());
        assert_eq!(commitment_from_str("anything"), CommitmentConfig::confirmed());
    }

    #[test]
    fn bad_addresses_are_rejected_before_any_request() {
        assert!(matches!(
            parse_pubkey("not-base58!"),
            Err(RpcError::InvalidAddress(_))
        ));
    }
}
