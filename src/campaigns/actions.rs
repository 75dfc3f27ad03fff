// Campaign program calls and the direct-write path
//
// Each action validates its input, submits one instruction, and on success
// commits the matching store batch. Program rejections surface as
// `FundsuError::Program` with the decoded message.

use std::str::FromStr;
use std::sync::Arc;

use borsh::BorshSerialize;
use serde::Serialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::{Pubkey, MAX_SEED_LEN};
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_program;

use super::accounts::instruction_discriminator;
use crate::config::ProgramConfig;
use crate::errors::{FundsuError, FundsuResult, ValidationError};
use crate::logger::{self, LogTag};
use crate::rpc::LedgerClient;
use crate::store::records::{
    campaign_created_batch, contribution_batch, ensure_balance, validate_amount,
    validate_image_url, validate_title, withdrawal_batch, NewCampaign,
};
use crate::store::DocumentStore;
use crate::utils::{format_address_short, format_signature_short, sol_to_lamports, unix_now};

// =============================================================================
// INSTRUCTION ENCODING
// =============================================================================

#[derive(BorshSerialize)]
struct InitializeCampaignArgs {
    title: String,
    description: String,
    target_amount: u64,
}

#[derive(BorshSerialize)]
struct ContributeArgs {
    amount: u64,
}

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> FundsuResult<Vec<u8>> {
    let mut data = instruction_discriminator(name).to_vec();
    let encoded = borsh::to_vec(args).map_err(|e| FundsuError::parse_error("instruction args", e))?;
    data.extend(encoded);
    Ok(data)
}

/// Accounts shared by all three instructions: signer, campaign, system program
fn campaign_accounts(signer: &Pubkey, campaign: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*signer, true),
        AccountMeta::new(*campaign, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

/// Campaign address: PDA of `[title, campaign_seed, author]`
pub fn derive_campaign_address(
    program_id: &Pubkey,
    campaign_seed: &str,
    title: &str,
    author: &Pubkey,
) -> FundsuResult<Pubkey> {
    if title.len() > MAX_SEED_LEN {
        return Err(ValidationError::InvalidField {
            field: "title".to_string(),
            reason: format!("must be at most {} bytes", MAX_SEED_LEN),
        }
        .into());
    }
    Pubkey::try_find_program_address(
        &[title.as_bytes(), campaign_seed.as_bytes(), author.as_ref()],
        program_id,
    )
    .map(|(address, _bump)| address)
    .ok_or_else(|| FundsuError::invalid_address(title, "no viable campaign address"))
}

pub fn initialize_campaign_ix(
    program_id: &Pubkey,
    authority: &Pubkey,
    campaign: &Pubkey,
    title: &str,
    description: &str,
    target_amount: u64,
) -> FundsuResult<Instruction> {
    let args = InitializeCampaignArgs {
        title: title.to_string(),
        description: description.to_string(),
        target_amount,
    };
    Ok(Instruction {
        program_id: *program_id,
        accounts: campaign_accounts(authority, campaign),
        data: instruction_data("initialize_campaign", &args)?,
    })
}

pub fn contribute_ix(
    program_id: &Pubkey,
    contributor: &Pubkey,
    campaign: &Pubkey,
    amount: u64,
) -> FundsuResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: campaign_accounts(contributor, campaign),
        data: instruction_data("contribute", &ContributeArgs { amount })?,
    })
}

pub fn withdraw_all_ix(program_id: &Pubkey, author: &Pubkey, campaign: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: campaign_accounts(author, campaign),
        data: instruction_discriminator("withdraw_all").to_vec(),
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: String,
    /// Target in SOL
    pub target_sol: f64,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReceipt {
    pub campaign: String,
    pub signature: String,
    pub lamports: u64,
}

fn lamports_from_sol(sol: f64) -> Result<u64, ValidationError> {
    let lamports = sol_to_lamports(sol).ok_or_else(|| ValidationError::InvalidAmount {
        reason: format!("{} is not a valid SOL amount", sol),
    })?;
    validate_amount(lamports)?;
    Ok(lamports)
}

pub struct CampaignActions {
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn DocumentStore>,
    program_id: Pubkey,
    campaign_seed: String,
}

impl CampaignActions {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn DocumentStore>,
        program: &ProgramConfig,
    ) -> FundsuResult<Self> {
        let program_id = Pubkey::from_str(&program.program_id)
            .map_err(|e| FundsuError::invalid_address(&program.program_id, e))?;
        Ok(Self {
            ledger,
            store,
            program_id,
            campaign_seed: program.campaign_seed.clone(),
        })
    }

    pub fn campaign_address(&self, title: &str, author: &Pubkey) -> FundsuResult<Pubkey> {
        derive_campaign_address(&self.program_id, &self.campaign_seed, title, author)
    }

    fn campaign_pubkey(address: &str) -> FundsuResult<Pubkey> {
        Pubkey::from_str(address).map_err(|e| FundsuError::invalid_address(address, e))
    }

    pub async fn create_campaign(
        &self,
        signer: &Keypair,
        request: CreateCampaignRequest,
    ) -> FundsuResult<ActionReceipt> {
        validate_title(&request.title)?;
        validate_image_url(&request.image_url)?;
        let target_amount = lamports_from_sol(request.target_sol)?;

        let author = signer.pubkey();
        let campaign = self.campaign_address(&request.title, &author)?;
        let ix = initialize_campaign_ix(
            &self.program_id,
            &author,
            &campaign,
            &request.title,
            &request.description,
            target_amount,
        )?;

        let signature = self.ledger.send_instructions(vec![ix], signer).await?;
        logger::info(
            LogTag::Actions,
            &format!(
                "Created campaign '{}' at {} ({})",
                request.title,
                format_address_short(&campaign.to_string()),
                format_signature_short(&signature)
            ),
        );

        let batch = campaign_created_batch(&NewCampaign {
            address: campaign.to_string(),
            author: author.to_string(),
            title: request.title,
            description: request.description,
            target_amount,
            image_url: request.image_url,
            tx_hash: signature.clone(),
            timestamp: unix_now(),
        });
        self.store.commit(batch).await?;

        Ok(ActionReceipt {
            campaign: campaign.to_string(),
            signature,
            lamports: 0,
        })
    }

    pub async fn contribute(
        &self,
        signer: &Keypair,
        campaign_address: &str,
        amount_sol: f64,
    ) -> FundsuResult<ActionReceipt> {
        let amount = lamports_from_sol(amount_sol)?;
        let campaign_key = Self::campaign_pubkey(campaign_address)?;
        let campaign = self
            .store
            .campaign(campaign_address)
            .await?
            .ok_or_else(|| FundsuError::not_found("campaigns", campaign_address))?;

        let contributor = signer.pubkey();
        let balance = self.ledger.get_balance(&contributor.to_string()).await?;
        ensure_balance(amount, balance)?;

        let ix = contribute_ix(&self.program_id, &contributor, &campaign_key, amount)?;
        let signature = self.ledger.send_instructions(vec![ix], signer).await?;
        logger::info(
            LogTag::Actions,
            &format!(
                "Contributed {} lamports to '{}' ({})",
                amount,
                campaign.title,
                format_signature_short(&signature)
            ),
        );

        let batch = contribution_batch(&campaign, &contributor.to_string(), amount, &signature, unix_now());
        self.store.commit(batch).await?;

        Ok(ActionReceipt {
            campaign: campaign_address.to_string(),
            signature,
            lamports: amount,
        })
    }

    /// Withdraw everything raised; the program only accepts the author
    pub async fn withdraw_all(&self, signer: &Keypair, campaign_address: &str) -> FundsuResult<ActionReceipt> {
        let campaign_key = Self::campaign_pubkey(campaign_address)?;
        let campaign = self
            .store
            .campaign(campaign_address)
            .await?
            .ok_or_else(|| FundsuError::not_found("campaigns", campaign_address))?;

        let author = signer.pubkey();
        let ix = withdraw_all_ix(&self.program_id, &author, &campaign_key);
        let signature = match self.ledger.send_instructions(vec![ix], signer).await {
            Ok(signature) => signature,
            Err(e) => {
                let err = FundsuError::from(e);
                logger::error(
                    LogTag::Actions,
                    &format!("Withdrawal from '{}' failed: {}", campaign.title, err),
                );
                return Err(err);
            }
        };

        let amount = campaign.current_amount;
        let batch = withdrawal_batch(&campaign, &author.to_string(), amount, &signature, unix_now());
        self.store.commit(batch).await?;

        logger::info(
            LogTag::Actions,
            &format!(
                "Withdrew {} lamports from '{}' ({})",
                amount,
                campaign.title,
                format_signature_short(&signature)
            ),
        );

        Ok(ActionReceipt {
            campaign: campaign_address.to_string(),
            signature,
            lamports: amount,
        })
    }
}
