//! Balance fetching with retries and shape validation

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::retry::RetryPolicy;
use crate::shared::errors::{DataError, FetchError};
use crate::shared::types::Nanotons;

/// Source of raw balance readings for an address
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Raw balance reading exactly as the endpoint returned it
    async fn get_balance(&self, address: &str) -> Result<Value, FetchError>;
}

/// Wraps a [`BalanceSource`] with a retry policy
pub struct BalanceFetcher {
    source: Arc<dyn BalanceSource>,
    policy: RetryPolicy,
}

impl BalanceFetcher {
    pub fn new(source: Arc<dyn BalanceSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub async fn fetch_balance(&self, address: &str) -> Result<Value, FetchError> {
        self.policy
            .run(address, || self.source.get_balance(address))
            .await
    }
}

/// Read a raw balance as a non-negative integer nanoton count.
///
/// Accepts a JSON integer or a string of decimal digits (the form toncenter
/// uses). Anything else is a data error.
pub fn parse_nanotons(raw: &Value) -> Result<Nanotons, DataError> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .map(Nanotons::new)
            .ok_or_else(|| DataError::UnexpectedShape(format!("number {}", n))),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<u64>()
            .map(Nanotons::new)
            .map_err(|e| DataError::UnexpectedShape(format!("string {:?}: {}", s, e))),
        other => Err(DataError::UnexpectedShape(value_kind(other).to_string())),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
