use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use solana_sdk::signer::Signer;
use tokio::sync::Notify;

use fundsu::{
    arguments::{CampaignCommand, Cli, Command, ProfileCommand, WalletCommand},
    campaigns::{CampaignActions, CreateCampaignRequest, ProgramScanner},
    config::{load_config_from_path, Config},
    display,
    errors::FundsuError,
    logger::{self, LogTag},
    rpc::{LedgerClient, SolanaLedgerClient},
    store::{
        open_store,
        records::{ensure_user_profile, update_user_profile, ProfileEdit},
    },
    sync::ReconciliationSync,
    transactions::{aggregate, ClassifiedTransfer, ContributionFetcher, FetchOptions, TransferKind},
    utils::{format_address_short, lamports_to_sol},
    wallet::{self, WalletBackup},
};

const LOG_DIR: &str = "data/logs";

/// Main entry point for the FundsU indexer
///
/// Parses the command line, sets up logging, then dispatches to one command.
/// Long-running commands (`serve`, looping `sync`) stop on Ctrl-C.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init(cli.logger_config(), Path::new(LOG_DIR));

    for tag in cli.unknown_debug_tags() {
        logger::warning(LogTag::System, &format!("Unknown debug tag '{}'", tag));
    }

    let result = run(cli).await;
    if let Err(e) = &result {
        logger::error(LogTag::System, &format!("{:#}", e));
    }
    logger::flush();

    if result.is_err() {
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config_from_path(&cli.config).map_err(anyhow::Error::msg)?;
    logger::debug(
        LogTag::Config,
        &format!(
            "Loaded {} (rpc {}, program {}, store {:?})",
            cli.config, config.rpc.url, config.program.program_id, config.store.backend
        ),
    );

    let ledger: Arc<dyn LedgerClient> = Arc::new(SolanaLedgerClient::new(&config.rpc));

    match cli.command {
        Command::Sync => run_sync(&config, ledger).await,
        Command::Scan => run_scan(&config, ledger).await,
        Command::Contributions {
            campaign,
            limit,
            author,
        } => run_contributions(&config, ledger, &campaign, limit, author).await,
        Command::Serve => run_serve(config, ledger).await,
        Command::Wallet { action } => run_wallet(&config, action),
        Command::Campaign { action } => run_campaign(&config, ledger, action).await,
        Command::Profile { action } => run_profile(&config, ledger, action).await,
    }
}

/// Notify every target once when Ctrl-C is pressed
fn install_shutdown_handler(targets: Vec<Arc<Notify>>) -> Result<()> {
    ctrlc::set_handler(move || {
        logger::info(LogTag::System, "Shutdown requested");
        for target in &targets {
            target.notify_one();
        }
    })
    .context("Failed to install Ctrl-C handler")
}

fn build_sync(config: &Config, ledger: Arc<dyn LedgerClient>) -> Result<ReconciliationSync> {
    let store = open_store(&config.store)?;
    Ok(ReconciliationSync::new(
        build_scanner(config, ledger),
        store,
        config.sync.clone(),
    ))
}

fn build_scanner(config: &Config, ledger: Arc<dyn LedgerClient>) -> ProgramScanner {
    ProgramScanner::new(
        ledger,
        &config.program,
        config.scanner.clone(),
        config.fetcher.clone(),
    )
}

async fn run_sync(config: &Config, ledger: Arc<dyn LedgerClient>) -> Result<()> {
    let sync = build_sync(config, ledger)?;

    if config.sync.interval_secs == 0 {
        let report = sync.run_once().await?;
        println!("{}", display::sync_report_table(&report));
        return Ok(());
    }

    let shutdown = Arc::new(Notify::new());
    install_shutdown_handler(vec![shutdown.clone()])?;
    logger::info(
        LogTag::Sync,
        &format!("Syncing every {}s, Ctrl-C to stop", config.sync.interval_secs),
    );
    sync.run_loop(shutdown).await;
    Ok(())
}

async fn run_scan(config: &Config, ledger: Arc<dyn LedgerClient>) -> Result<()> {
    let scan = build_scanner(config, ledger)
        .scan()
        .await
        .map_err(FundsuError::from)?;

    println!("{}", display::scan_table(&scan));
    for (account_type, count) in &scan.account_counts {
        println!("{}: {}", account_type, count);
    }
    Ok(())
}

async fn run_contributions(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
    campaign: &str,
    limit: Option<usize>,
    author: Option<String>,
) -> Result<()> {
    let fetcher = ContributionFetcher::new(ledger, config.fetcher.clone());
    let options = FetchOptions {
        limit,
        author,
        ..FetchOptions::default()
    };
    let transfers = fetcher
        .fetch_contributions(campaign, &options)
        .await
        .map_err(FundsuError::from)?;

    if transfers.is_empty() {
        println!("No transfers found for {}", campaign);
        return Ok(());
    }

    println!("{}", display::transfers_table(&transfers));
    let contributions: Vec<ClassifiedTransfer> = transfers
        .into_iter()
        .filter(|t| t.kind == TransferKind::Contribution)
        .collect();
    println!("{}", display::stats_table(&aggregate(&contributions)));
    Ok(())
}

#[cfg(feature = "web")]
async fn run_serve(config: Config, ledger: Arc<dyn LedgerClient>) -> Result<()> {
    use fundsu::auth::TokenIssuer;
    use fundsu::webserver::{start_server, AppState};

    let store = open_store(&config.store)?;
    let issuer = TokenIssuer::from_config(&config.auth)?;
    let webserver_config = config.webserver.clone();
    let interval_secs = config.sync.interval_secs;
    let state = Arc::new(AppState::new(config, ledger, store, issuer));

    let server_shutdown = Arc::new(Notify::new());
    let sync_shutdown = Arc::new(Notify::new());
    install_shutdown_handler(vec![server_shutdown.clone(), sync_shutdown.clone()])?;

    let sync_task = if interval_secs > 0 {
        let sync = state.sync.clone();
        Some(tokio::spawn(async move { sync.run_loop(sync_shutdown).await }))
    } else {
        None
    };

    let served = start_server(state, &webserver_config, server_shutdown).await;

    if let Some(task) = sync_task {
        if let Err(e) = task.await {
            logger::error(LogTag::Sync, &format!("Sync loop task failed: {}", e));
        }
    }
    served.map_err(anyhow::Error::msg)
}

#[cfg(not(feature = "web"))]
async fn run_serve(_config: Config, _ledger: Arc<dyn LedgerClient>) -> Result<()> {
    anyhow::bail!("fundsu was built without the `web` feature")
}

fn run_wallet(config: &Config, action: WalletCommand) -> Result<()> {
    let local = Path::new(&config.wallet.backup_path);

    match action {
        WalletCommand::Import { file } => {
            let backup = wallet::import_backup(&file)?;
            wallet::export_backup(local, &backup)?;
            println!("Imported wallet {}", backup.keypair()?.pubkey());
        }
        WalletCommand::Export { file } => {
            let backup = wallet::import_backup(local)?;
            wallet::export_backup(&file, &backup)?;
            println!("Backup written to {}", file.display());
            println!("{}", backup.warning);
        }
        WalletCommand::Restore { words } => {
            let words = wallet::parse_seed_phrase(&words).map_err(FundsuError::from)?;
            let backup = WalletBackup::new(words, chrono::Utc::now()).map_err(FundsuError::from)?;
            wallet::export_backup(local, &backup)?;
            println!("Restored wallet {}", backup.keypair()?.pubkey());
        }
        WalletCommand::Address => {
            println!("{}", wallet::load_keypair(local)?.pubkey());
        }
    }
    Ok(())
}

async fn run_campaign(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
    action: CampaignCommand,
) -> Result<()> {
    let signer = wallet::load_keypair(Path::new(&config.wallet.backup_path))
        .context("No local wallet, run `fundsu wallet restore` or `wallet import` first")?;
    let store = open_store(&config.store)?;
    let actions = CampaignActions::new(ledger, store, &config.program)?;

    let receipt = match action {
        CampaignCommand::Create {
            title,
            description,
            target,
            image_url,
        } => {
            actions
                .create_campaign(
                    &signer,
                    CreateCampaignRequest {
                        title,
                        description,
                        target_sol: target,
                        image_url,
                    },
                )
                .await
        }
        CampaignCommand::Contribute { campaign, amount } => {
            actions.contribute(&signer, &campaign, amount).await
        }
        CampaignCommand::Withdraw { campaign } => actions.withdraw_all(&signer, &campaign).await,
    }
    .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!(
        "Campaign {}: {:.6} SOL, signature {}",
        format_address_short(&receipt.campaign),
        lamports_to_sol(receipt.lamports),
        receipt.signature
    );
    Ok(())
}

async fn run_profile(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
    action: ProfileCommand,
) -> Result<()> {
    let address = wallet::load_keypair(Path::new(&config.wallet.backup_path))?
        .pubkey()
        .to_string();
    let store = open_store(&config.store)?;

    let profile = match action {
        ProfileCommand::Show => {
            let balance = match ledger.get_balance(&address).await {
                Ok(lamports) => Some(lamports_to_sol(lamports)),
                Err(e) => {
                    logger::warning(
                        LogTag::Wallet,
                        &format!("Balance unavailable for {}: {}", address, e),
                    );
                    None
                }
            };
            ensure_user_profile(store.as_ref(), &address, balance).await?
        }
        ProfileCommand::Edit {
            name,
            bio,
            website,
            avatar_url,
            notifications,
        } => {
            let edit = ProfileEdit {
                name,
                bio,
                website,
                profile_url: avatar_url,
                notifications_enabled: notifications,
                ..ProfileEdit::default()
            };
            update_user_profile(store.as_ref(), &address, edit)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}
