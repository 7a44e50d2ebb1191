//! Log sink setup: console plus an append-only log file

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ISO-8601 UTC timestamp in brackets, e.g. `[2024-05-01T12:00:00.000Z]`
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketedUtc;

impl FormatTime for BracketedUtc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("open log file {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(BracketedUtc).with_target(false))
        .with(
            fmt::layer()
                .with_timer(BracketedUtc)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("install tracing subscriber")?;

    Ok(())
}
