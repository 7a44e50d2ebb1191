//! toncenter v2 JSON-RPC client for balance queries

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::domain::balance::BalanceSource;
use crate::shared::errors::FetchError;

/// Public mainnet JSON-RPC endpoint
pub const DEFAULT_TONCENTER_ENDPOINT: &str = "https://toncenter.com/api/v2/jsonRPC";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    id: u32,
    jsonrpc: &'static str,
    method: &'static str,
    params: AddressParams<'a>,
}

#[derive(Debug, Serialize)]
struct AddressParams<'a> {
    address: &'a str,
}

/// Envelope of every toncenter reply
#[derive(Debug, Deserialize)]
struct ToncenterResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// toncenter client
pub struct ToncenterClient {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ToncenterClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl BalanceSource for ToncenterClient {
    async fn get_balance(&self, address: &str) -> Result<Value, FetchError> {
        let body = JsonRpcRequest {
            id: 1,
            jsonrpc: "2.0",
            method: "getAddressBalance",
            params: AddressParams { address },
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-API-Key", api_key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let raw = interpret_response(status, &bytes)?;
        debug!("Raw balance for {}: {}", address, raw);
        Ok(raw)
    }
}

/// Map an HTTP status and body to the balance reading or an error.
///
/// toncenter reports API errors with a non-2xx status and an `ok: false`
/// envelope, so the body is examined before the status.
fn interpret_response(status: u16, body: &[u8]) -> Result<Value, FetchError> {
    let parsed: ToncenterResponse = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(_) if !(200..300).contains(&status) => return Err(FetchError::Status(status)),
        Err(e) => return Err(FetchError::Decode(e.to_string())),
    };

    if !parsed.ok {
        return Err(FetchError::Api {
            code: parsed.code,
            message: parsed.error.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    parsed
        .result
        .ok_or_else(|| FetchError::Decode("response has no result".to_string()))
}
