//! quark-autosave: keep destination directories in sync with read-only
//! cloud-drive shares.
//!
//! One invocation is one run: verify every account, claim the daily
//! sign-in reward where possible, mirror each account's tasks, dispatch
//! the aggregated notifications and write task mutations back to the
//! config file. Scheduling across runs belongs to cron or the platform
//! task runner, not to this binary.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use core_http::{HttpClient, ReqwestHttpClient};
use core_runtime::logging::init_logging;
use core_runtime::notify::channels_for;
use core_runtime::Config;
use core_sync::{growth, DriveGateway, MediaLibrary, RunContext, SyncCoordinator};
use futures::future::join_all;
use provider_emby::EmbyClient;
use provider_quark::QuarkClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "quark-autosave",
    version,
    about = "Mirror read-only cloud-drive shares into your own space"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every account's tasks once
    Run {
        /// Path to the JSON config file
        config: PathBuf,

        /// Only run the task at this index (per selected account)
        task_index: Option<usize>,

        /// Only run the account at this index
        account_index: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info").context("failed to initialize logging")?;

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            task_index,
            account_index,
        } => run(config, task_index, account_index).await,
    }
}

async fn run(
    config_path: PathBuf,
    task_index: Option<usize>,
    account_index: Option<usize>,
) -> Result<()> {
    let started = Instant::now();
    info!(config = %config_path.display(), "quark-autosave starting");

    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    if config.accounts.is_empty() {
        bail!("config has no accounts");
    }

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    let library = connect_library(&config, http.clone()).await;

    let clients: Vec<Arc<QuarkClient>> = config
        .accounts
        .iter()
        .map(|account| {
            Arc::new(QuarkClient::new(
                http.clone(),
                &account.cookie,
                config.tuning.page_size,
            ))
        })
        .collect();

    // All accounts are verified up front, concurrently; unverified ones
    // still get a sign-in attempt (sign-in-only credentials are a
    // supported configuration) but no sync pass.
    let verified = join_all(clients.iter().enumerate().map(|(index, client)| async move {
        if !client.has_account_cookie() {
            info!(account = index, "Credential is sign-in only");
            return Verification::SignInOnly;
        }
        match client.account_info().await {
            Ok(identity) => {
                info!(account = index, nickname = %identity.nickname, "Account verified");
                Verification::Ok
            }
            Err(e) => {
                error!(account = index, error = %e, "Account verification failed");
                Verification::Failed(e.to_string())
            }
        }
    }))
    .await;

    let summaries = join_all(clients.iter().map(|client| growth::daily_sign(client.as_ref()))).await;
    for (index, summary) in summaries.iter().enumerate() {
        if let Some(summary) = summary {
            info!(account = index, "{}", summary);
        }
    }

    let today = Local::now().date_naive();
    let title = format!("Auto-save {}", today.format("%Y-%m-%d"));
    for (index, account) in config.accounts.iter_mut().enumerate() {
        if account_index.is_some_and(|only| only != index) {
            continue;
        }
        match &verified[index] {
            Verification::SignInOnly => continue,
            Verification::Failed(reason) => {
                let body = format!("❌ {}: login failed: {}", account.name, reason);
                dispatch(account, http.clone(), &title, &body).await;
                continue;
            }
            Verification::Ok => {}
        }
        info!(account = index, name = %account.name, "Running account");

        let coordinator = SyncCoordinator::new(
            clients[index].clone(),
            library.clone(),
            config.magic_regex.clone(),
        );
        let mut ctx = RunContext::new(config.tuning.clone());
        coordinator
            .run_account(&mut ctx, &mut account.tasklist, task_index, today)
            .await;

        if ctx.has_notifications() {
            let body = ctx.take_notification_body();
            dispatch(account, http.clone(), &title, &body).await;
        }
    }

    // Bans and discovered library ids must survive into the next run.
    config
        .save(&config_path)
        .with_context(|| format!("failed to write config back to {}", config_path.display()))?;

    info!(elapsed = ?started.elapsed(), "Run complete");
    Ok(())
}

enum Verification {
    Ok,
    SignInOnly,
    Failed(String),
}

/// Send one aggregated notification through every channel the account
/// has configured; accounts without endpoints stay log-only.
async fn dispatch(
    account: &core_runtime::AccountConfig,
    http: Arc<dyn HttpClient>,
    title: &str,
    body: &str,
) {
    for channel in channels_for(account, http.clone()) {
        if let Err(e) = channel.send(title, body).await {
            warn!(error = %e, "Notification dispatch failed");
        }
    }
}

/// Probe the configured media library; refresh is disabled for the whole
/// run when it is absent or unreachable.
async fn connect_library(
    config: &Config,
    http: Arc<dyn HttpClient>,
) -> Option<Arc<dyn MediaLibrary>> {
    if config.emby.url.is_empty() || config.emby.apikey.is_empty() {
        return None;
    }
    let emby = EmbyClient::new(http, &config.emby.url, &config.emby.apikey);
    match emby.info().await {
        Ok(identity) => {
            info!(server = %identity, "Media library connected");
            Some(Arc::new(emby))
        }
        Err(e) => {
            warn!(error = %e, "Media library unreachable, refresh disabled");
            None
        }
    }
}
