use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tonwatch::app::{self, RunMode};
use tonwatch::config::Config;
use tonwatch::shared::logging;

#[derive(Parser, Debug)]
#[command(version, about = "Track TON wallet balances and report changes to Telegram")]
struct Args {
    /// Path to a TOML config file (optional, environment variables take priority)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check interval in minutes (overrides CHECK_INTERVAL)
    #[arg(long)]
    interval: Option<u64>,

    /// Where tracked wallets are stored (overrides WALLETS_FILE)
    #[arg(long)]
    wallets_file: Option<PathBuf>,

    /// Log file to append to (overrides LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run the first check immediately instead of after one interval
    #[arg(long)]
    run_on_start: bool,

    /// Run a single check and exit
    #[arg(long, conflicts_with = "run_on_start")]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Priority: CLI args > environment > config file > defaults
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;

    if let Some(interval) = args.interval {
        config.tracker.check_interval_minutes = interval;
    }
    if let Some(wallets_file) = args.wallets_file {
        config.tracker.wallets_file = wallets_file;
    }
    if let Some(log_file) = args.log_file {
        config.tracker.log_file = log_file;
    }

    config.validate()?;
    logging::init(&config.tracker.log_file)?;

    let mode = if args.once {
        RunMode::Once
    } else {
        RunMode::Service {
            run_on_start: args.run_on_start,
        }
    };

    app::run(config, mode).await
}
