//! Tracked wallets

pub mod wallet_store;

pub use wallet_store::{SharedWalletStore, WalletStore};
