//! Common types used across the application

use crate::shared::errors::DataError;

/// Nanotons per whole TON
pub const NANOTONS_PER_TON: u64 = 1_000_000_000;

/// Balance in whole TON, as stored and reported
pub type TonBalance = f64;

/// Amount in the smallest on-chain unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nanotons(pub u64);

impl Nanotons {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Convert to whole TON
    pub fn to_ton(&self) -> Result<TonBalance, DataError> {
        let balance = self.0 as f64 / NANOTONS_PER_TON as f64;
        if !balance.is_finite() {
            return Err(DataError::NotFinite(self.0));
        }
        Ok(balance)
    }
}

/// A detected change for one tracked wallet
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChange {
    pub address: String,
    pub previous: TonBalance,
    pub current: TonBalance,
}

impl BalanceChange {
    pub fn new(address: impl Into<String>, previous: TonBalance, current: TonBalance) -> Self {
        Self {
            address: address.into(),
            previous,
            current,
        }
    }

    /// Signed difference, new minus previous
    pub fn delta(&self) -> f64 {
        self.current - self.previous
    }
}
