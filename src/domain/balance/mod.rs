//! Balance queries

pub mod fetcher;
pub mod retry;

pub use fetcher::{parse_nanotons, BalanceFetcher, BalanceSource};
pub use retry::RetryPolicy;
