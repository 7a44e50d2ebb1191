//! One reconciliation pass: fetch, compare, notify, persist

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::balance::{parse_nanotons, BalanceFetcher};
use crate::domain::notification::{balance_change_message, Notifier};
use crate::domain::wallet::SharedWalletStore;
use crate::shared::errors::CheckError;
use crate::shared::types::BalanceChange;

/// Outcome of checking one wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalletOutcome {
    Unchanged,
    Changed { notified: bool },
    /// Removed from the store while its balance was being fetched
    Untracked,
}

/// Counters for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub failed: usize,
    pub skipped_untracked: usize,
    pub notifications_failed: usize,
    pub persisted: bool,
}

/// Walks every tracked wallet once per pass, strictly one at a time
pub struct Reconciler {
    store: SharedWalletStore,
    fetcher: BalanceFetcher,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(
        store: SharedWalletStore,
        fetcher: BalanceFetcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            fetcher,
            notifier,
        }
    }

    /// Run a full pass, then persist the store once.
    ///
    /// The address list is snapshotted up front. A failure for one wallet is
    /// logged and skipped; it never stops the rest of the pass.
    pub async fn run_pass(&self) -> PassReport {
        let addresses = self.store.lock().await.addresses();
        let mut report = PassReport::default();

        info!("Checking {} wallet(s)", addresses.len());

        for address in &addresses {
            report.checked += 1;
            match self.check_wallet(address).await {
                Ok(WalletOutcome::Unchanged) => report.unchanged += 1,
                Ok(WalletOutcome::Changed { notified }) => {
                    report.changed += 1;
                    if !notified {
                        report.notifications_failed += 1;
                    }
                }
                Ok(WalletOutcome::Untracked) => report.skipped_untracked += 1,
                Err(CheckError::Fetch(e)) => {
                    error!("Error checking wallet {}: {}", address, e);
                    report.failed += 1;
                }
                Err(CheckError::Data(e)) => {
                    error!("Error: bad balance data for address {}: {}", address, e);
                    report.failed += 1;
                }
            }
        }

        report.persisted = self.store.lock().await.persist();

        info!(
            "Pass complete: {} checked, {} changed, {} unchanged, {} failed",
            report.checked, report.changed, report.unchanged, report.failed
        );
        report
    }

    async fn check_wallet(&self, address: &str) -> Result<WalletOutcome, CheckError> {
        let raw = self.fetcher.fetch_balance(address).await?;
        let balance = parse_nanotons(&raw)?.to_ton()?;

        // The lock is not held across the fetch, so membership is checked again here.
        let change = {
            let mut store = self.store.lock().await;
            let Some(previous) = store.get(address) else {
                info!("Wallet {} was untracked during the pass, dropping reading", address);
                return Ok(WalletOutcome::Untracked);
            };
            if balance == previous {
                return Ok(WalletOutcome::Unchanged);
            }
            store.set(address, balance);
            BalanceChange::new(address, previous, balance)
        };

        let message = balance_change_message(&change);
        match self.notifier.notify(&message).await {
            Ok(()) => {
                info!("Notification sent for {}: {}", address, message);
                Ok(WalletOutcome::Changed { notified: true })
            }
            Err(e) => {
                error!("Failed to send notification for {}: {}", address, e);
                Ok(WalletOutcome::Changed { notified: false })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::balance::{BalanceSource, RetryPolicy};
    use crate::domain::wallet::WalletStore;
    use crate::shared::errors::{FetchError, NotifyError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Replies with a fixed reading per address; unknown addresses fail.
    #[derive(Default)]
    struct ScriptedSource {
        readings: HashMap<String, Value>,
        calls: Mutex<HashMap<String, u32>>,
    }

    impl ScriptedSource {
        fn with(mut self, address: &str, raw: Value) -> Self {
            self.readings.insert(address.to_string(), raw);
            self
        }

        fn calls_for(&self, address: &str) -> u32 {
            self.calls.lock().unwrap().get(address).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl BalanceSource for ScriptedSource {
        async fn get_balance(&self, address: &str) -> Result<Value, FetchError> {
            *self.calls.lock().unwrap().entry(address.to_string()).or_default() += 1;
            self.readings
                .get(address)
                .cloned()
                .ok_or_else(|| FetchError::Transport("connection refused".to_string()))
        }
    }

    /// Untracks the wallet while its fetch is in flight
    struct UntrackingSource {
        store: SharedWalletStore,
    }

    #[async_trait]
    impl BalanceSource for UntrackingSource {
        async fn get_balance(&self, address: &str) -> Result<Value, FetchError> {
            self.store.lock().await.remove(address);
            Ok(json!("5000000000"))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("timed out".to_string()));
            }
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn store_with(wallets: &[(&str, f64)]) -> (TempDir, SharedWalletStore) {
        let dir = tempdir().unwrap();
        let mut store = WalletStore::new(dir.path().join("wallets.json"));
        for (address, balance) in wallets {
            store.set(*address, *balance);
        }
        assert!(store.persist());
        (dir, store.into_shared())
    }

    fn reconciler(
        store: &SharedWalletStore,
        source: Arc<dyn BalanceSource>,
        notifier: Arc<RecordingNotifier>,
    ) -> Reconciler {
        let fetcher = BalanceFetcher::new(source, RetryPolicy::new(3, Duration::ZERO));
        Reconciler::new(store.clone(), fetcher, notifier)
    }

    #[tokio::test]
    async fn test_unchanged_pass_sends_nothing() {
        let (dir, store) = store_with(&[("addrA", 1.0), ("addrB", 2.5)]);
        let before = std::fs::read_to_string(dir.path().join("wallets.json")).unwrap();

        let source = Arc::new(
            ScriptedSource::default()
                .with("addrA", json!("1000000000"))
                .with("addrB", json!("2500000000")),
        );
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source, notifier.clone()).run_pass().await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.changed, 0);
        assert!(report.persisted);
        assert!(notifier.messages().is_empty());

        let after = std::fs::read_to_string(dir.path().join("wallets.json")).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_increase_is_notified_and_stored() {
        let (dir, store) = store_with(&[("addrA", 2.0)]);
        let source = Arc::new(ScriptedSource::default().with("addrA", json!("2500000000")));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source, notifier.clone()).run_pass().await;

        assert_eq!(report.changed, 1);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("addrA"));
        assert!(messages[0].contains("+0.500000"));
        assert!(messages[0].contains("2.500000"));

        assert_eq!(store.lock().await.get("addrA"), Some(2.5));
        let persisted = WalletStore::load(dir.path().join("wallets.json"));
        assert_eq!(persisted.get("addrA"), Some(2.5));
    }

    #[tokio::test]
    async fn test_decrease_is_notified_with_negative_delta() {
        let (_dir, store) = store_with(&[("addrA", 2.5)]);
        let source = Arc::new(ScriptedSource::default().with("addrA", json!(2_000_000_000u64)));
        let notifier = Arc::new(RecordingNotifier::default());

        reconciler(&store, source, notifier.clone()).run_pass().await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("-0.500000"));
        assert!(messages[0].contains("2.000000"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_skip_wallet() {
        let (_dir, store) = store_with(&[("addrA", 3.0)]);
        let source = Arc::new(ScriptedSource::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source.clone(), notifier.clone()).run_pass().await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.changed, 0);
        assert_eq!(source.calls_for("addrA"), 3);
        assert_eq!(store.lock().await.get("addrA"), Some(3.0));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reading_is_a_data_error() {
        let (_dir, store) = store_with(&[("addrA", 3.0)]);
        let source = Arc::new(ScriptedSource::default().with("addrA", json!({"balance": "oops"})));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source.clone(), notifier.clone()).run_pass().await;

        assert_eq!(report.failed, 1);
        // Data errors are not retried.
        assert_eq!(source.calls_for("addrA"), 1);
        assert_eq!(store.lock().await.get("addrA"), Some(3.0));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_wallet_does_not_block_others() {
        let (_dir, store) = store_with(&[("addr1", 1.0), ("addr2", 1.0), ("addr3", 1.0)]);
        let source = Arc::new(
            ScriptedSource::default()
                .with("addr1", json!("4000000000"))
                .with("addr3", json!("500000000")),
        );
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source, notifier.clone()).run_pass().await;

        assert_eq!(report.changed, 2);
        assert_eq!(report.failed, 1);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("addr1"));
        assert!(messages[1].contains("addr3"));

        let store = store.lock().await;
        assert_eq!(store.get("addr1"), Some(4.0));
        assert_eq!(store.get("addr2"), Some(1.0));
        assert_eq!(store.get("addr3"), Some(0.5));
    }

    #[tokio::test]
    async fn test_untracked_mid_pass_is_not_resurrected() {
        let (_dir, store) = store_with(&[("addrA", 1.0)]);
        let source = Arc::new(UntrackingSource { store: store.clone() });
        let notifier = Arc::new(RecordingNotifier::default());

        let report = reconciler(&store, source, notifier.clone()).run_pass().await;

        assert_eq!(report.skipped_untracked, 1);
        assert!(store.lock().await.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_notification_keeps_update() {
        let (_dir, store) = store_with(&[("addrA", 0.0)]);
        let source = Arc::new(ScriptedSource::default().with("addrA", json!("1000000000")));
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });

        let report = reconciler(&store, source, notifier).run_pass().await;

        assert_eq!(report.changed, 1);
        assert_eq!(report.notifications_failed, 1);
        assert_eq!(store.lock().await.get("addrA"), Some(1.0));
    }
}
