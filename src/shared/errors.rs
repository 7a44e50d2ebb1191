//! Error handling for the application

use thiserror::Error;

/// Balance query errors. All of these are treated as transient and retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned status {0}")]
    Status(u16),

    #[error("API error (code {code:?}): {message}")]
    Api { code: Option<i64>, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Balance data that came back in a form we cannot use
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Unexpected balance type: {0}")]
    UnexpectedShape(String),

    #[error("Balance is not a finite number (raw reading: {0})")]
    NotFinite(u64),
}

/// Why a single wallet was skipped during a pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Data(#[from] DataError),
}

/// Wallet store persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Notification delivery errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Configuration errors, only ever raised at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
