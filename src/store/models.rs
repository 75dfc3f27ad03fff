// Documents persisted in the off-chain mirror
//
// Field names follow the collection documents read by the front-end
// (snake_case, `type` for the ledger record kind).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub timestamp: i64,
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Campaign document, keyed by the on-chain campaign address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: String,
    pub campaign_wallet_key: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub target_amount: u64,
    pub current_amount: u64,
    /// True until the target is met or the campaign closes
    pub locked: bool,
    pub likes: u64,
    pub dislikes: u64,
    /// Set once funds have been withdrawn
    pub closed: bool,
    pub timestamp: i64,
    pub category: String,
    pub image_url: String,
    pub contributors_count: u64,
    pub deadline: i64,
    pub tags: Vec<String>,
    pub updates: Vec<CampaignUpdate>,
    /// Creation transaction signature
    pub tx_hash: String,
}

impl Default for Campaign {
    fn default() -> Self {
        Self {
            id: String::new(),
            campaign_wallet_key: String::new(),
            author: String::new(),
            title: String::new(),
            description: String::new(),
            target_amount: 0,
            current_amount: 0,
            locked: true,
            likes: 0,
            dislikes: 0,
            closed: false,
            timestamp: 0,
            category: String::new(),
            image_url: String::new(),
            contributors_count: 0,
            deadline: 0,
            tags: Vec::new(),
            updates: Vec::new(),
            tx_hash: String::new(),
        }
    }
}

impl Campaign {
    /// Lock state implied by the amounts and the closed flag
    pub fn expected_locked(current_amount: u64, target_amount: u64, closed: bool) -> bool {
        !closed && current_amount < target_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Contribution,
    Deposit,
    Withdraw,
    CampaignCreated,
    CampaignClosed,
    Transfer,
    Refund,
    Reward,
    Fee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Contribution => "contribution",
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::CampaignCreated => "campaign_created",
            TransactionType::CampaignClosed => "campaign_closed",
            TransactionType::Transfer => "transfer",
            TransactionType::Refund => "refund",
            TransactionType::Reward => "reward",
            TransactionType::Fee => "fee",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Ledger record, keyed by the blockchain transaction hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    pub amount: u64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub campaign_id: Option<String>,
    /// Wallet that initiated the transfer
    pub user_id: String,
    pub recipient_user_id: Option<String>,
    pub date: i64,
    pub tx_hash: String,
    pub status: TransactionStatus,
    pub description: String,
}

impl LedgerRecord {
    /// Completed record keyed by `tx_hash`
    pub fn completed(
        tx_hash: &str,
        tx_type: TransactionType,
        amount: u64,
        user_id: &str,
        date: i64,
        description: String,
    ) -> Self {
        Self {
            id: tx_hash.to_string(),
            amount,
            tx_type,
            campaign_id: None,
            user_id: user_id.to_string(),
            recipient_user_id: None,
            date,
            tx_hash: tx_hash.to_string(),
            status: TransactionStatus::Completed,
            description,
        }
    }

    pub fn for_campaign(mut self, campaign_id: &str) -> Self {
        self.campaign_id = Some(campaign_id.to_string());
        self
    }

    pub fn to_recipient(mut self, recipient: &str) -> Self {
        self.recipient_user_id = Some(recipient.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

/// Wallet-keyed identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub wallet_address: String,
    pub name: String,
    pub date_created: i64,
    pub profile_url: String,
    /// Balance in SOL at the last refresh
    pub wallet_balance: f64,
    pub bio: String,
    pub website: String,
    pub social_links: SocialLinks,
    pub campaigns_created: Vec<String>,
    pub campaigns_contributed: Vec<String>,
    pub total_contributions: u64,
    pub reputation_score: i64,
    pub notifications_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl UserProfile {
    /// Profile created on first sign-in
    pub fn new_for_wallet(wallet: &str, date_created: i64) -> Self {
        let prefix: String = wallet.chars().take(8).collect();
        Self {
            id: wallet.to_string(),
            wallet_address: wallet.to_string(),
            name: format!("User_{}", prefix),
            date_created,
            notifications_enabled: true,
            ..Self::default()
        }
    }
}
