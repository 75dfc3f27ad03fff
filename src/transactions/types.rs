// Types produced by transfer classification
use serde::{Deserialize, Serialize};

/// Direction of a transfer relative to the inspected account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Funds flowing into the inspected account
    Contribution,
    /// Funds flowing out of the inspected account
    Withdrawal,
    Other,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransferKind::Contribution => "contribution",
            TransferKind::Withdrawal => "withdrawal",
            TransferKind::Other => "other",
        };
        write!(f, "{}", label)
    }
}

/// A value movement attributed to one campaign account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedTransfer {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub from: String,
    pub to: String,
    pub lamports: u64,
    /// Emitted from a CPI block rather than a top-level instruction
    pub is_inner: bool,
    /// Index of the top-level instruction (the enclosing one for CPI)
    pub instruction_index: Option<usize>,
    /// Enclosing program id for CPI, parser name for top-level transfers
    pub parent_program: Option<String>,
    pub memo: Option<String>,
    pub kind: TransferKind,
}

impl ClassifiedTransfer {
    /// Key shared by a structured record and its balance-delta twin
    pub fn dedup_key(&self) -> (String, String, u64) {
        (self.signature.clone(), self.from.clone(), self.lamports)
    }
}

/// Summary statistics over one campaign's transfers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionStats {
    pub total_contributions: usize,
    pub total_amount: u64,
    pub unique_contributors: usize,
    pub average_contribution: f64,
    pub largest_contribution: u64,
}
