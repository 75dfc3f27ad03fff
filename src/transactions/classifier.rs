// Transfer classification for a single parsed transaction
//
// Structured pass first: every system transfer (top-level and CPI) whose
// destination or source is the target account. Only when that pass finds
// nothing does the balance-delta heuristic run.

use super::types::{ClassifiedTransfer, TransferKind};
use crate::logger::{self, LogTag};
use crate::rpc::{InstructionKind, ParsedInstruction, ParsedTransaction};
use crate::utils::format_signature_short;

/// Default tolerance between the target's delta and its counterparty's
pub const DEFAULT_BALANCE_TOLERANCE: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct TransferClassifier {
    balance_tolerance: u64,
}

impl Default for TransferClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE_TOLERANCE)
    }
}

struct Location<'a> {
    is_inner: bool,
    index: usize,
    parent_program: Option<&'a str>,
}

impl TransferClassifier {
    pub fn new(balance_tolerance: u64) -> Self {
        Self { balance_tolerance }
    }

    /// Classify all transfers of `tx` that touch `target`
    ///
    /// Failed transactions and transactions without balance metadata yield
    /// nothing.
    pub fn classify(&self, tx: &ParsedTransaction, target: &str) -> Vec<ClassifiedTransfer> {
        if tx.is_failed() {
            logger::debug(
                LogTag::Classifier,
                &format!("Skipping failed transaction {}", format_signature_short(&tx.signature)),
            );
            return Vec::new();
        }
        if tx.pre_balances.is_empty() || tx.post_balances.is_empty() {
            return Vec::new();
        }

        let mut records = Vec::new();

        for (index, instruction) in tx.instructions.iter().enumerate() {
            let location = Location {
                is_inner: false,
                index,
                parent_program: instruction.program.as_deref(),
            };
            self.inspect(tx, target, instruction, &location, &mut records);
        }

        for block in &tx.inner_instructions {
            let parent_program = tx
                .instructions
                .get(block.index)
                .map(|parent| parent.program_id.as_str());
            for instruction in &block.instructions {
                let location = Location {
                    is_inner: true,
                    index: block.index,
                    parent_program,
                };
                self.inspect(tx, target, instruction, &location, &mut records);
            }
        }

        if records.is_empty() {
            if let Some(record) = self.classify_by_balance(tx, target) {
                logger::debug(
                    LogTag::Classifier,
                    &format!(
                        "Balance fallback: {} {} lamports in {}",
                        record.kind,
                        record.lamports,
                        format_signature_short(&tx.signature)
                    ),
                );
                records.push(record);
            }
        }

        records
    }

    fn inspect(
        &self,
        tx: &ParsedTransaction,
        target: &str,
        instruction: &ParsedInstruction,
        location: &Location<'_>,
        records: &mut Vec<ClassifiedTransfer>,
    ) {
        match &instruction.kind {
            InstructionKind::Transfer {
                source,
                destination,
                lamports,
            } => {
                if destination == target {
                    records.push(self.record(tx, source, destination, *lamports, location, TransferKind::Contribution));
                }
                if source == target {
                    records.push(self.record(tx, source, destination, *lamports, location, TransferKind::Withdrawal));
                }
            }
            InstructionKind::Memo(text) => {
                if let Some(last) = records.last_mut() {
                    last.memo = Some(text.clone());
                }
            }
            InstructionKind::Other => {}
        }
    }

    fn record(
        &self,
        tx: &ParsedTransaction,
        from: &str,
        to: &str,
        lamports: u64,
        location: &Location<'_>,
        kind: TransferKind,
    ) -> ClassifiedTransfer {
        ClassifiedTransfer {
            signature: tx.signature.clone(),
            slot: tx.slot,
            block_time: tx.block_time,
            from: from.to_string(),
            to: to.to_string(),
            lamports,
            is_inner: location.is_inner,
            instruction_index: Some(location.index),
            parent_program: location.parent_program.map(str::to_string),
            memo: None,
            kind,
        }
    }

    /// Attribute the target's net balance change to the best matching counterparty
    fn classify_by_balance(&self, tx: &ParsedTransaction, target: &str) -> Option<ClassifiedTransfer> {
        let target_index = tx.account_index(target)?;
        let target_delta = tx.balance_delta(target_index)?;
        if target_delta == 0 {
            return None;
        }

        let amount = target_delta.unsigned_abs();
        let tolerance = self.balance_tolerance as u128;
        let incoming = target_delta > 0;

        let counterparty = (0..tx.account_keys.len())
            .filter(|&i| i != target_index)
            .filter_map(|i| tx.balance_delta(i).map(|delta| (i, delta)))
            .filter(|&(_, delta)| if incoming { delta < 0 } else { delta > 0 })
            .filter(|&(_, delta)| delta.unsigned_abs().abs_diff(amount) < tolerance)
            .max_by_key(|&(_, delta)| delta.unsigned_abs())
            .map(|(i, _)| tx.account_keys[i].clone())?;

        let lamports = u64::try_from(amount).ok()?;
        let (from, to, kind) = if incoming {
            (counterparty, target.to_string(), TransferKind::Contribution)
        } else {
            (target.to_string(), counterparty, TransferKind::Withdrawal)
        };

        Some(ClassifiedTransfer {
            signature: tx.signature.clone(),
            slot: tx.slot,
            block_time: tx.block_time,
            from,
            to,
            lamports,
            is_inner: false,
            instruction_index: None,
            parent_program: None,
            memo: None,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::TxBuilder;

    const CAMPAIGN: &str = "Campaign1111111111111111111111111111111111";
    const ALICE: &str = "Alice11111111111111111111111111111111111111";
    const BOB: &str = "Bob1111111111111111111111111111111111111111";
    const PROGRAM: &str = "9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr";

    #[test]
    fn top_level_transfer_into_target_is_contribution() {
        let tx = TxBuilder::new("sig-a", 100)
            .transfer(ALICE, CAMPAIGN, 2_000_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::Contribution);
        assert_eq!(records[0].from, ALICE);
        assert_eq!(records[0].to, CAMPAIGN);
        assert!(!records[0].is_inner);
        assert_eq!(records[0].parent_program.as_deref(), Some("system"));
    }

    #[test]
    fn inner_transfer_records_enclosing_program() {
        let tx = TxBuilder::new("sig-b", 100)
            .inner_transfer(PROGRAM, CAMPAIGN, BOB, 500_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::Withdrawal);
        assert_eq!(records[0].to, BOB);
        assert!(records[0].is_inner);
        assert_eq!(records[0].parent_program.as_deref(), Some(PROGRAM));
    }

    #[test]
    fn classified_endpoint_always_equals_target() {
        let tx = TxBuilder::new("sig-c", 100)
            .transfer(ALICE, CAMPAIGN, 3_000_000)
            .transfer(ALICE, BOB, 7_000_000)
            .inner_transfer(PROGRAM, CAMPAIGN, BOB, 1_000_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);

        assert_eq!(records.len(), 2);
        for record in &records {
            match record.kind {
                TransferKind::Contribution => assert_eq!(record.to, CAMPAIGN),
                TransferKind::Withdrawal => assert_eq!(record.from, CAMPAIGN),
                TransferKind::Other => panic!("unexpected other"),
            }
        }
    }

    #[test]
    fn failed_transaction_yields_nothing() {
        let tx = TxBuilder::new("sig-d", 100)
            .transfer(ALICE, CAMPAIGN, 2_000_000)
            .failed()
            .build();
        assert!(TransferClassifier::default().classify(&tx, CAMPAIGN).is_empty());
    }

    #[test]
    fn memo_attaches_to_latest_record() {
        let tx = TxBuilder::new("sig-e", 100)
            .transfer(ALICE, CAMPAIGN, 2_000_000)
            .memo("good luck")
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);
        assert_eq!(records[0].memo.as_deref(), Some("good luck"));
    }

    #[test]
    fn balance_fallback_picks_largest_matching_sender() {
        // Campaign +1_000_000; Alice -1_005_000 (fee payer), Bob -1_000_000.
        // Both are within tolerance; Alice has the larger magnitude.
        let tx = TxBuilder::new("sig-f", 100)
            .opaque_call(PROGRAM, &[ALICE, BOB, CAMPAIGN])
            .balance_change(CAMPAIGN, 1_000_000)
            .balance_change(ALICE, -1_005_000)
            .balance_change(BOB, -1_000_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::Contribution);
        assert_eq!(records[0].from, ALICE);
        assert_eq!(records[0].lamports, 1_000_000);
        assert_eq!(records[0].instruction_index, None);
    }

    #[test]
    fn balance_fallback_withdrawal_and_tolerance_bound() {
        let tx = TxBuilder::new("sig-g", 100)
            .opaque_call(PROGRAM, &[CAMPAIGN, BOB])
            .balance_change(CAMPAIGN, -500_000)
            .balance_change(BOB, 500_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::Withdrawal);
        assert_eq!(records[0].to, BOB);

        // Counterparty off by exactly the tolerance does not match
        let tx = TxBuilder::new("sig-h", 100)
            .opaque_call(PROGRAM, &[CAMPAIGN, BOB])
            .balance_change(CAMPAIGN, -500_000)
            .balance_change(BOB, 490_000)
            .build();
        assert!(TransferClassifier::default().classify(&tx, CAMPAIGN).is_empty());
    }

    #[test]
    fn fallback_skipped_when_structured_pass_matched() {
        let tx = TxBuilder::new("sig-i", 100)
            .transfer(ALICE, CAMPAIGN, 2_000_000)
            .balance_change(CAMPAIGN, 5_000_000)
            .balance_change(BOB, -5_000_000)
            .build();
        let records = TransferClassifier::default().classify(&tx, CAMPAIGN);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from, ALICE);
    }

    #[test]
    fn untouched_target_yields_nothing() {
        let tx = TxBuilder::new("sig-j", 100).transfer(ALICE, BOB, 2_000_000).build();
        assert!(TransferClassifier::default().classify(&tx, CAMPAIGN).is_empty());
    }
}
