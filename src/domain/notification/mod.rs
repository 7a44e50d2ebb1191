//! Outbound notifications

pub mod notifier;

pub use notifier::{balance_change_message, Notifier};
