//! Telegram Bot API client: outbound messages and update polling

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::domain::notification::Notifier;
use crate::shared::errors::NotifyError;

/// Public Bot API host
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Every Bot API reply is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self) -> Result<T, NotifyError> {
        if !self.ok {
            return Err(NotifyError::Rejected(
                self.description.unwrap_or_else(|| "no description".to_string()),
            ));
        }
        self.result
            .ok_or_else(|| NotifyError::Rejected("response has no result".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Incoming update; only messages are requested
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: Option<String>,
}

/// The two Bot API calls the command listener needs
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Long-poll for new updates starting at `offset`
    async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, NotifyError>;

    /// Send `text` to any chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Bot API client bound to one bot token and one destination chat
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, bot_token: &str, chat_id: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
            chat_id,
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, NotifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let envelope: TelegramResponse<T> = response.json().await?;
        envelope.into_result()
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, NotifyError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        // The HTTP timeout has to outlast the server-side long poll.
        self.call("getUpdates", &request, poll_timeout + Duration::from_secs(10))
            .await
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessageRequest { chat_id, text },
                Duration::from_secs(30),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.send_message(&self.chat_id, message).await
    }
}
