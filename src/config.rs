use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::domain::balance::RetryPolicy;
use crate::infrastructure::blockchain::DEFAULT_TONCENTER_ENDPOINT;
use crate::infrastructure::telegram::DEFAULT_TELEGRAM_API_URL;
use crate::shared::errors::ConfigError;

/// Largest interval whose length in seconds still fits in a `u64`
pub const MAX_INTERVAL_MINUTES: u64 = u64::MAX / 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramCfg {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

impl Default for TelegramCfg {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToncenterCfg {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ToncenterCfg {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TONCENTER_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerCfg {
    pub check_interval_minutes: u64,
    pub wallets_file: PathBuf,
    pub log_file: PathBuf,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        let polling = RetryPolicy::balance_polling();
        Self {
            check_interval_minutes: 15,
            wallets_file: PathBuf::from("wallets.json"),
            log_file: PathBuf::from("tracker.log"),
            retry_attempts: polling.max_attempts,
            retry_delay_ms: polling.delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramCfg,
    pub toncenter: ToncenterCfg,
    pub tracker: TrackerCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Overlay settings from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay settings from any key lookup; empty values are ignored
    pub fn apply_vars<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("TELEGRAM_API_URL") {
            self.telegram.api_url = v;
        }
        if let Some(v) = get("TONCENTER_API_ENDPOINT") {
            self.toncenter.endpoint = v;
        }
        if let Some(v) = get("TONCENTER_API_KEY") {
            self.toncenter.api_key = Some(v);
        }
        if let Some(v) = get("CHECK_INTERVAL") {
            self.tracker.check_interval_minutes = v.parse().map_err(|e| ConfigError::Invalid {
                key: "CHECK_INTERVAL",
                reason: format!("{:?} is not a whole number of minutes: {}", v, e),
            })?;
        }
        if let Some(v) = get("WALLETS_FILE") {
            self.tracker.wallets_file = PathBuf::from(v);
        }
        if let Some(v) = get("LOG_FILE") {
            self.tracker.log_file = PathBuf::from(v);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
        }
        if self.telegram.chat_id.is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_CHAT_ID"));
        }
        if self.toncenter.endpoint.is_empty() {
            return Err(ConfigError::Missing("TONCENTER_API_ENDPOINT"));
        }
        if self.tracker.check_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "check_interval_minutes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.tracker.check_interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid {
                key: "check_interval_minutes",
                reason: format!("must be at most {}", MAX_INTERVAL_MINUTES),
            });
        }
        if self.tracker.retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "retry_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.tracker.check_interval_minutes.saturating_mul(60))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.tracker.retry_attempts,
            Duration::from_millis(self.tracker.retry_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toncenter.timeout_secs)
    }
}
