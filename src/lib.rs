//! tonwatch - TON wallet balance tracker
//! Polls tracked wallets, reports changes to a Telegram chat, keeps balances on disk

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{CommandHandler, Reconciler, Scheduler};
pub use config::Config;
pub use domain::balance::{BalanceFetcher, RetryPolicy};
pub use domain::wallet::WalletStore;
