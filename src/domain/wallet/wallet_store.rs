//! File-backed store of tracked wallets and their last known balances

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::shared::errors::StoreError;
use crate::shared::types::TonBalance;

/// Store handle shared between the reconciler and the command handler
pub type SharedWalletStore = Arc<Mutex<WalletStore>>;

/// Address -> last known balance in TON, persisted as pretty JSON
#[derive(Debug)]
pub struct WalletStore {
    path: PathBuf,
    wallets: BTreeMap<String, TonBalance>,
}

impl WalletStore {
    /// Empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wallets: BTreeMap::new(),
        }
    }

    /// Load the store from `path`. A missing file gives an empty store; an
    /// unreadable or malformed one is logged and also gives an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);

        let content = match fs::read_to_string(&store.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No wallet file at {}, starting empty", store.path.display());
                return store;
            }
            Err(e) => {
                error!("Error reading {}: {}", store.path.display(), e);
                return store;
            }
        };

        match serde_json::from_str::<BTreeMap<String, TonBalance>>(&content) {
            Ok(wallets) => {
                info!("Loaded {} wallet(s) from {}", wallets.len(), store.path.display());
                store.wallets = wallets;
            }
            Err(e) => {
                error!("Error parsing {}: {}", store.path.display(), e);
            }
        }

        store
    }

    pub fn into_shared(self) -> SharedWalletStore {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, address: &str) -> Option<TonBalance> {
        self.wallets.get(address).copied()
    }

    pub fn set(&mut self, address: impl Into<String>, balance: TonBalance) {
        self.wallets.insert(address.into(), balance);
    }

    /// Start tracking `address` at zero. Returns false if already tracked.
    pub fn insert_new(&mut self, address: &str) -> bool {
        if self.wallets.contains_key(address) {
            return false;
        }
        self.wallets.insert(address.to_string(), 0.0);
        true
    }

    pub fn remove(&mut self, address: &str) -> bool {
        self.wallets.remove(address).is_some()
    }

    /// Snapshot of the tracked addresses
    pub fn addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TonBalance)> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Write the whole mapping, replacing the previous file
    pub fn try_persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.wallets)?;

        // Write beside the target and rename, so a failed write keeps the old file intact.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|source| StoreError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }

    /// Persist and log any failure. Returns whether the write succeeded.
    pub fn persist(&self) -> bool {
        match self.try_persist() {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving wallets to file: {}", e);
                false
            }
        }
    }
}
