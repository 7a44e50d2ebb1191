//! Fixed-interval driver for reconciliation passes

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use super::reconciler::Reconciler;

/// Fires a pass every `period` until shutdown.
///
/// Passes never overlap: a pass is awaited inside the tick loop and ticks
/// missed while it ran are skipped.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    period: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(reconciler: Arc<Reconciler>, period: Duration) -> Self {
        Self {
            reconciler,
            period,
            run_on_start: false,
        }
    }

    /// Also run a pass right away instead of waiting one full period
    pub fn run_on_start(mut self, enabled: bool) -> Self {
        self.run_on_start = enabled;
        self
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let first_tick = if self.run_on_start {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut interval = interval_at(first_tick, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Scheduler started, checking every {:?}", self.period);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.reconciler.run_pass().await;
                }
                _ = shutdown.changed() => {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::balance::{BalanceFetcher, BalanceSource, RetryPolicy};
    use crate::domain::notification::Notifier;
    use crate::domain::wallet::WalletStore;
    use crate::shared::errors::{FetchError, NotifyError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl BalanceSource for CountingSource {
        async fn get_balance(&self, _address: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!("0"))
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    async fn run_for(run_on_start: bool, wait: Duration) -> u32 {
        let dir = tempdir().unwrap();
        let mut store = WalletStore::new(dir.path().join("wallets.json"));
        store.set("addrA", 0.0);

        let source = Arc::new(CountingSource::default());
        let fetcher = BalanceFetcher::new(source.clone(), RetryPolicy::new(3, Duration::ZERO));
        let reconciler = Arc::new(Reconciler::new(
            store.into_shared(),
            fetcher,
            Arc::new(SilentNotifier),
        ));

        let scheduler =
            Scheduler::new(reconciler, Duration::from_secs(15 * 60)).run_on_start(run_on_start);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(wait).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        source.calls.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_waits_one_period() {
        assert_eq!(run_for(false, Duration::from_secs(14 * 60)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_period() {
        assert_eq!(run_for(false, Duration::from_secs(31 * 60)).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_on_start() {
        assert_eq!(run_for(true, Duration::from_secs(60)).await, 1);
    }
}
