//! Wire type conversion
//!
//! Reduces `solana_transaction_status` UI types (jsonParsed encoding) to the
//! crate's `ParsedTransaction` model.

use super::types::{InnerInstructionBlock, InstructionKind, ParsedInstruction, ParsedTransaction, SignatureInfo};
use serde_json::Value;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInnerInstructions,
    UiInstruction, UiLoadedAddresses, UiMessage, UiParsedInstruction,
};

pub const SYSTEM_PROGRAM_NAME: &str = "system";
pub const MEMO_PROGRAM_NAME: &str = "spl-memo";

pub fn signature_info_from_status(status: RpcConfirmedTransactionStatusWithSignature) -> SignatureInfo {
    SignatureInfo {
        signature: status.signature,
        slot: status.slot,
        err: status.err.map(|e| format!("{:?}", e)),
        memo: status.memo,
        block_time: status.block_time,
    }
}

/// Convert a jsonParsed transaction
///
/// Returns `None` when the node sent no execution metadata or a binary
/// encoding; such transactions carry nothing to classify.
pub fn parsed_transaction_from_encoded(
    signature: &str,
    encoded: EncodedConfirmedTransactionWithStatusMeta,
) -> Option<ParsedTransaction> {
    let meta = encoded.transaction.meta?;
    let ui_transaction = match encoded.transaction.transaction {
        EncodedTransaction::Json(tx) => tx,
        _ => return None,
    };

    let (account_keys, top_level) = match ui_transaction.message {
        UiMessage::Parsed(message) => (
            message
                .account_keys
                .into_iter()
                .map(|account| account.pubkey)
                .collect::<Vec<_>>(),
            message.instructions,
        ),
        UiMessage::Raw(message) => {
            let mut keys = message.account_keys;
            let loaded: Option<UiLoadedAddresses> = Option::from(meta.loaded_addresses.clone());
            if let Some(loaded) = loaded {
                keys.extend(loaded.writable);
                keys.extend(loaded.readonly);
            }
            (keys, message.instructions.into_iter().map(UiInstruction::Compiled).collect())
        }
    };

    let instructions = top_level
        .into_iter()
        .map(|ix| convert_instruction(ix, &account_keys))
        .collect();

    let inner: Option<Vec<UiInnerInstructions>> =
        Option::from(meta.inner_instructions.clone());
    let inner_instructions = inner
        .unwrap_or_default()
        .into_iter()
        .map(|block| InnerInstructionBlock {
            index: block.index as usize,
            instructions: block
                .instructions
                .into_iter()
                .map(|ix| convert_instruction(ix, &account_keys))
                .collect(),
        })
        .collect();

    let log_messages: Option<Vec<String>> = Option::from(meta.log_messages.clone());

    Some(ParsedTransaction {
        signature: signature.to_string(),
        slot: encoded.slot,
        block_time: encoded.block_time,
        account_keys,
        instructions,
        inner_instructions,
        pre_balances: meta.pre_balances,
        post_balances: meta.post_balances,
        err: meta.err.map(|e| format!("{:?}", e)),
        log_messages: log_messages.unwrap_or_default(),
    })
}

fn convert_instruction(instruction: UiInstruction, account_keys: &[String]) -> ParsedInstruction {
    match instruction {
        UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => {
            let kind = instruction_kind(&parsed.program, &parsed.parsed);
            ParsedInstruction {
                program: Some(parsed.program),
                program_id: parsed.program_id,
                kind,
            }
        }
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(partial)) => ParsedInstruction {
            program: None,
            program_id: partial.program_id,
            kind: InstructionKind::Other,
        },
        UiInstruction::Compiled(compiled) => ParsedInstruction {
            program: None,
            program_id: account_keys
                .get(compiled.program_id_index as usize)
                .cloned()
                .unwrap_or_default(),
            kind: InstructionKind::Other,
        },
    }
}

/// Interpret the `parsed` payload of a jsonParsed instruction
pub fn instruction_kind(program: &str, parsed: &Value) -> InstructionKind {
    match program {
        SYSTEM_PROGRAM_NAME => {
            let ix_type = parsed.get("type").and_then(Value::as_str);
            if !matches!(ix_type, Some("transfer") | Some("transferWithSeed")) {
                return InstructionKind::Other;
            }
            let info = match parsed.get("info") {
                Some(info) => info,
                None => return InstructionKind::Other,
            };
            let source = info.get("source").and_then(Value::as_str);
            let destination = info.get("destination").and_then(Value::as_str);
            let lamports = info.get("lamports").and_then(Value::as_u64);
            match (source, destination, lamports) {
                (Some(source), Some(destination), Some(lamports)) => InstructionKind::Transfer {
                    source: source.to_string(),
                    destination: destination.to_string(),
                    lamports,
                },
                _ => InstructionKind::Other,
            }
        }
        MEMO_PROGRAM_NAME => match parsed.as_str() {
            Some(text) => InstructionKind::Memo(text.to_string()),
            None => InstructionKind::Other,
        },
        _ => InstructionKind::Other,
    }
}
