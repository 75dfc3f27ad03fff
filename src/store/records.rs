// Direct-write helpers
//
// Batches written right after a successful program call, profile bootstrap
// on sign-in, and the synchronous input checks that run before any network
// call.

use super::batch::{CampaignPatch, UserMerge, WriteBatch};
use super::models::{Campaign, LedgerRecord, SocialLinks, TransactionType, UserProfile};
use super::DocumentStore;
use crate::errors::{FundsuError, FundsuResult, ValidationError};
use crate::logger::{self, LogTag};
use crate::utils::format_address_short;

// =============================================================================
// VALIDATION
// =============================================================================

/// Accepts empty (no image) or an absolute http/https URL
pub fn validate_image_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidImageUrl {
            url: value.to_string(),
        }),
    }
}

pub fn validate_amount(lamports: u64) -> Result<(), ValidationError> {
    if lamports == 0 {
        return Err(ValidationError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "title".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// `required` must fit in `available`
pub fn ensure_balance(required: u64, available: u64) -> Result<(), ValidationError> {
    if required > available {
        return Err(ValidationError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

// =============================================================================
// CAMPAIGN ACTION BATCHES
// =============================================================================

/// Campaign as known right after `initialize_campaign` confirmed
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub address: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub target_amount: u64,
    pub image_url: String,
    pub tx_hash: String,
    pub timestamp: i64,
}

pub fn campaign_created_batch(new: &NewCampaign) -> WriteBatch {
    let campaign = Campaign {
        id: new.address.clone(),
        campaign_wallet_key: new.address.clone(),
        author: new.author.clone(),
        title: new.title.clone(),
        description: new.description.clone(),
        target_amount: new.target_amount,
        image_url: new.image_url.clone(),
        timestamp: new.timestamp,
        tx_hash: new.tx_hash.clone(),
        ..Campaign::default()
    };

    let record = LedgerRecord::completed(
        &new.tx_hash,
        TransactionType::CampaignCreated,
        0,
        &new.author,
        new.timestamp,
        format!("Created campaign: {}", new.title),
    )
    .for_campaign(&new.address);

    let mut batch = WriteBatch::new();
    batch
        .create_campaign(campaign)
        .create_transaction(record)
        .merge_user(UserMerge {
            add_campaigns_created: vec![new.address.clone()],
            ..UserMerge::new(&new.author)
        });
    batch
}

/// Contribution of `amount` lamports by `contributor`, confirmed as `signature`
pub fn contribution_batch(
    campaign: &Campaign,
    contributor: &str,
    amount: u64,
    signature: &str,
    date: i64,
) -> WriteBatch {
    let record = LedgerRecord::completed(
        signature,
        TransactionType::Contribution,
        amount,
        contributor,
        date,
        format!("Contribution to campaign: {}", campaign.title),
    )
    .for_campaign(&campaign.id)
    .to_recipient(&campaign.author);

    let mut batch = WriteBatch::new();
    batch
        .patch_campaign(CampaignPatch {
            increment_current_amount: amount,
            increment_contributors: 1,
            // Against the committed amount, not this snapshot's
            relock_from_amounts: true,
            ..CampaignPatch::new(&campaign.id)
        })
        .merge_user(UserMerge {
            add_campaigns_contributed: vec![campaign.id.clone()],
            increment_total_contributions: amount,
            ..UserMerge::new(contributor)
        })
        .create_transaction(record);
    batch
}

/// Withdrawal of the raised funds by the campaign author
pub fn withdrawal_batch(
    campaign: &Campaign,
    author: &str,
    amount: u64,
    signature: &str,
    date: i64,
) -> WriteBatch {
    let record = LedgerRecord::completed(
        signature,
        TransactionType::Withdraw,
        amount,
        author,
        date,
        format!("Withdrawal from {} campaign", campaign.title),
    )
    .for_campaign(&campaign.id);

    let mut batch = WriteBatch::new();
    batch
        .patch_campaign(CampaignPatch {
            closed: Some(true),
            locked: Some(false),
            ..CampaignPatch::new(&campaign.id)
        })
        .create_transaction(record);
    batch
}

// =============================================================================
// USER PROFILES
// =============================================================================

/// Profile fields a user can edit
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub profile_url: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub notifications_enabled: Option<bool>,
}

/// Profile for `wallet`, created on first sign-in
///
/// `wallet_balance` (SOL) refreshes the stored balance when given.
pub async fn ensure_user_profile(
    store: &dyn DocumentStore,
    wallet: &str,
    wallet_balance: Option<f64>,
) -> FundsuResult<UserProfile> {
    let existing = store.user(wallet).await?;
    if existing.is_some() && wallet_balance.is_none() {
        return existing.ok_or_else(|| FundsuError::not_found("users", wallet));
    }

    if existing.is_none() {
        logger::info(
            LogTag::Store,
            &format!("Creating profile for {}", format_address_short(wallet)),
        );
    }

    let mut batch = WriteBatch::new();
    batch.merge_user(UserMerge {
        wallet_balance,
        ..UserMerge::new(wallet)
    });
    store.commit(batch).await?;

    store
        .user(wallet)
        .await?
        .ok_or_else(|| FundsuError::not_found("users", wallet))
}

pub async fn update_user_profile(
    store: &dyn DocumentStore,
    wallet: &str,
    edit: ProfileEdit,
) -> FundsuResult<UserProfile> {
    if let Some(url) = &edit.profile_url {
        validate_image_url(url)?;
    }
    if let Some(name) = &edit.name {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
    }

    let mut batch = WriteBatch::new();
    batch.merge_user(UserMerge {
        name: edit.name,
        bio: edit.bio,
        website: edit.website,
        profile_url: edit.profile_url,
        social_links: edit.social_links,
        notifications_enabled: edit.notifications_enabled,
        ..UserMerge::new(wallet)
    });
    store.commit(batch).await?;

    store
        .user(wallet)
        .await?
        .ok_or_else(|| FundsuError::not_found("users", wallet))
}
