// Atomic write batches
//
// A batch is applied all-or-nothing. Creates never overwrite: an existing key
// is reported as skipped. Patches and merges apply field-level sets,
// increments and array-unions against the current document.

use super::models::{Campaign, LedgerRecord, SocialLinks, UserProfile};
use serde::{Deserialize, Serialize};

/// Field-level update of an existing campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignPatch {
    pub id: String,
    pub current_amount: Option<u64>,
    pub locked: Option<bool>,
    pub closed: Option<bool>,
    pub contributors_count: Option<u64>,
    pub increment_current_amount: u64,
    pub increment_contributors: u64,
    /// Recompute `locked` from the stored amounts once everything else applied
    #[serde(default)]
    pub relock_from_amounts: bool,
}

impl CampaignPatch {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Apply to `campaign`; sets first, then increments, then the relock
    pub fn apply(&self, campaign: &mut Campaign) {
        if let Some(value) = self.current_amount {
            campaign.current_amount = value;
        }
        if let Some(value) = self.locked {
            campaign.locked = value;
        }
        if let Some(value) = self.closed {
            campaign.closed = value;
        }
        if let Some(value) = self.contributors_count {
            campaign.contributors_count = value;
        }
        campaign.current_amount = campaign
            .current_amount
            .saturating_add(self.increment_current_amount);
        campaign.contributors_count = campaign
            .contributors_count
            .saturating_add(self.increment_contributors);
        if self.relock_from_amounts {
            campaign.locked = Campaign::expected_locked(
                campaign.current_amount,
                campaign.target_amount,
                campaign.closed,
            );
        }
    }
}

/// Create-or-merge update of a user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMerge {
    pub id: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub profile_url: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub notifications_enabled: Option<bool>,
    pub wallet_balance: Option<f64>,
    pub total_contributions: Option<u64>,
    pub increment_total_contributions: u64,
    pub add_campaigns_created: Vec<String>,
    pub add_campaigns_contributed: Vec<String>,
}

impl UserMerge {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Merge into `existing`, or into a fresh profile when absent
    pub fn apply(&self, existing: Option<UserProfile>, now: i64) -> UserProfile {
        let mut profile = existing.unwrap_or_else(|| UserProfile::new_for_wallet(&self.id, now));

        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(website) = &self.website {
            profile.website = website.clone();
        }
        if let Some(url) = &self.profile_url {
            profile.profile_url = url.clone();
        }
        if let Some(links) = &self.social_links {
            profile.social_links = links.clone();
        }
        if let Some(enabled) = self.notifications_enabled {
            profile.notifications_enabled = enabled;
        }
        if let Some(balance) = self.wallet_balance {
            profile.wallet_balance = balance;
        }
        if let Some(total) = self.total_contributions {
            profile.total_contributions = total;
        }
        profile.total_contributions = profile
            .total_contributions
            .saturating_add(self.increment_total_contributions);

        array_union(&mut profile.campaigns_created, &self.add_campaigns_created);
        array_union(&mut profile.campaigns_contributed, &self.add_campaigns_contributed);

        profile
    }
}

fn array_union(target: &mut Vec<String>, additions: &[String]) {
    for item in additions {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Create-if-absent
    CreateCampaign(Campaign),
    /// Create-if-absent
    CreateTransaction(LedgerRecord),
    /// Fails the batch when the campaign does not exist
    PatchCampaign(CampaignPatch),
    MergeUser(UserMerge),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_campaign(&mut self, campaign: Campaign) -> &mut Self {
        self.ops.push(WriteOp::CreateCampaign(campaign));
        self
    }

    pub fn create_transaction(&mut self, record: LedgerRecord) -> &mut Self {
        self.ops.push(WriteOp::CreateTransaction(record));
        self
    }

    pub fn patch_campaign(&mut self, patch: CampaignPatch) -> &mut Self {
        self.ops.push(WriteOp::PatchCampaign(patch));
        self
    }

    pub fn merge_user(&mut self, merge: UserMerge) -> &mut Self {
        self.ops.push(WriteOp::MergeUser(merge));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Outcome of a committed batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub campaigns_created: usize,
    pub transactions_created: usize,
    /// Keys of creates that found an existing document
    pub skipped: Vec<String>,
    pub campaigns_patched: usize,
    pub users_merged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_sets_then_increments() {
        let mut campaign = Campaign {
            current_amount: 500,
            contributors_count: 1,
            ..Campaign::default()
        };
        let patch = CampaignPatch {
            locked: Some(false),
            increment_current_amount: 500,
            increment_contributors: 1,
            ..CampaignPatch::new("c")
        };
        patch.apply(&mut campaign);
        assert_eq!(campaign.current_amount, 1_000);
        assert_eq!(campaign.contributors_count, 2);
        assert!(!campaign.locked);
    }

    #[test]
    fn relock_uses_amounts_after_increments() {
        let mut campaign = Campaign {
            current_amount: 600,
            target_amount: 1_000,
            locked: true,
            ..Campaign::default()
        };
        let patch = CampaignPatch {
            increment_current_amount: 400,
            relock_from_amounts: true,
            ..CampaignPatch::new("c")
        };
        patch.apply(&mut campaign);
        assert_eq!(campaign.current_amount, 1_000);
        assert!(!campaign.locked);
    }

    #[test]
    fn merge_creates_missing_profile_and_unions_arrays() {
        let merge = UserMerge {
            add_campaigns_contributed: vec!["c1".to_string(), "c1".to_string()],
            increment_total_contributions: 42,
            ..UserMerge::new("Wallet1234567890")
        };
        let profile = merge.apply(None, 7);
        assert_eq!(profile.name, "User_Wallet12");
        assert_eq!(profile.date_created, 7);
        assert!(profile.notifications_enabled);
        assert_eq!(profile.campaigns_contributed, vec!["c1".to_string()]);
        assert_eq!(profile.total_contributions, 42);

        let again = merge.apply(Some(profile), 9);
        assert_eq!(again.campaigns_contributed.len(), 1);
        assert_eq!(again.total_contributions, 84);
        assert_eq!(again.date_created, 7);
    }
}
