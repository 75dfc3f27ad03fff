// Contribution statistics for a single campaign
use super::types::{ClassifiedTransfer, ContributionStats};
use std::collections::HashSet;

/// Summarise `transfers`
///
/// Pure: an empty slice yields all-zero statistics.
pub fn aggregate(transfers: &[ClassifiedTransfer]) -> ContributionStats {
    let mut contributors = HashSet::new();
    let mut total_amount: u64 = 0;
    let mut largest_contribution: u64 = 0;

    for transfer in transfers {
        contributors.insert(transfer.from.as_str());
        total_amount = total_amount.saturating_add(transfer.lamports);
        largest_contribution = largest_contribution.max(transfer.lamports);
    }

    let average_contribution = if transfers.is_empty() {
        0.0
    } else {
        total_amount as f64 / transfers.len() as f64
    };

    ContributionStats {
        total_contributions: transfers.len(),
        total_amount,
        unique_contributors: contributors.len(),
        average_contribution,
        largest_contribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::types::TransferKind;

    fn transfer(signature: &str, from: &str, lamports: u64) -> ClassifiedTransfer {
        ClassifiedTransfer {
            signature: signature.to_string(),
            slot: 1,
            block_time: Some(1),
            from: from.to_string(),
            to: "campaign".to_string(),
            lamports,
            is_inner: false,
            instruction_index: Some(0),
            parent_program: Some("system".to_string()),
            memo: None,
            kind: TransferKind::Contribution,
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_contributions, 0);
        assert_eq!(stats.total_amount, 0);
        assert_eq!(stats.unique_contributors, 0);
        assert_eq!(stats.average_contribution, 0.0);
        assert_eq!(stats.largest_contribution, 0);
    }

    #[test]
    fn counts_distinct_senders_and_max() {
        let stats = aggregate(&[
            transfer("a", "alice", 2_000_000),
            transfer("b", "bob", 500_000),
            transfer("c", "alice", 1_000_000),
        ]);
        assert_eq!(stats.total_contributions, 3);
        assert_eq!(stats.total_amount, 3_500_000);
        assert_eq!(stats.unique_contributors, 2);
        assert_eq!(stats.largest_contribution, 2_000_000);
        assert!((stats.average_contribution - 3_500_000.0 / 3.0).abs() < 1e-6);
    }
}
