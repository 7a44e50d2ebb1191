// src/app.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::application::{CommandHandler, CommandListener, Reconciler, Scheduler};
use crate::config::Config;
use crate::domain::balance::BalanceFetcher;
use crate::domain::wallet::WalletStore;
use crate::infrastructure::blockchain::ToncenterClient;
use crate::infrastructure::telegram::TelegramClient;

/// How long the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll on the interval and answer commands until Ctrl-C
    Service { run_on_start: bool },
    /// A single pass, then exit
    Once,
}

pub async fn run(config: Config, mode: RunMode) -> Result<()> {
    info!("Starting TON wallet tracker");
    info!(
        "Endpoint: {}, interval: {} min, wallets file: {}",
        config.toncenter.endpoint,
        config.tracker.check_interval_minutes,
        config.tracker.wallets_file.display()
    );

    let store = WalletStore::load(&config.tracker.wallets_file).into_shared();

    let toncenter = ToncenterClient::new(
        config.toncenter.endpoint.clone(),
        config.toncenter.api_key.clone(),
        config.request_timeout(),
    )
    .context("build toncenter client")?;

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram.api_url,
        &config.telegram.bot_token,
        config.telegram.chat_id.clone(),
    ));

    let fetcher = BalanceFetcher::new(Arc::new(toncenter), config.retry_policy());
    let reconciler = Arc::new(Reconciler::new(store.clone(), fetcher, telegram.clone()));

    let run_on_start = match mode {
        RunMode::Once => {
            let report = reconciler.run_pass().await;
            info!("Single pass finished: {:?}", report);
            return Ok(());
        }
        RunMode::Service { run_on_start } => run_on_start,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(reconciler, config.check_interval()).run_on_start(run_on_start);
    let scheduler_rx = shutdown_rx.clone();
    let scheduler_handle = tokio::spawn(async move { scheduler.run(scheduler_rx).await });

    let listener = CommandListener::new(telegram, CommandHandler::new(store));
    let listener_handle = tokio::spawn(async move { listener.run(shutdown_rx).await });

    info!("Bot started.");

    tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;
    info!("Shutdown requested");
    // Receivers may already be gone if a task ended early; nothing to signal then.
    let _ = shutdown_tx.send(true);

    for (name, handle) in [("scheduler", scheduler_handle), ("command listener", listener_handle)] {
        if let Err(e) = handle.await {
            error!("{} task failed: {}", name, e);
        }
    }

    info!("Stopped");
    Ok(())
}
