//! Notification interface and message formatting

use async_trait::async_trait;

use crate::shared::errors::NotifyError;
use crate::shared::types::BalanceChange;
use crate::shared::utils::{format_amount, format_delta};

/// Sends messages to the single destination channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Message announcing a balance change
pub fn balance_change_message(change: &BalanceChange) -> String {
    format!(
        "🟢 TON wallet balance update!\n\nAddress: {}\nChange: {} TON\nNew balance: {} TON",
        change.address,
        format_delta(change.delta()),
        format_amount(change.current),
    )
}
