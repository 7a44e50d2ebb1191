//! Telegram long-polling loop feeding the command handler

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::commands::CommandHandler;
use crate::infrastructure::telegram::{BotApi, Update};

const POLL_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Receives chat commands and answers them in the chat they came from
pub struct CommandListener {
    client: Arc<dyn BotApi>,
    handler: CommandHandler,
}

impl CommandListener {
    pub fn new(client: Arc<dyn BotApi>, handler: CommandHandler) -> Self {
        Self { client, handler }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset: Option<i64> = None;
        info!("Listening for chat commands");

        loop {
            let polled = tokio::select! {
                polled = self.client.get_updates(offset, POLL_TIMEOUT) => polled,
                _ = shutdown.changed() => break,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = next_offset(offset, &update);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!("Failed to poll chat updates: {}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(ERROR_PAUSE) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        info!("Command listener stopping");
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };

        let sender = message
            .from
            .as_ref()
            .and_then(|user| user.username.clone())
            .unwrap_or_else(|| "unknown".to_string());
        debug!("Message from {} in chat {}: {}", sender, message.chat.id, text);

        let Some(reply) = self.handler.handle_text(text).await else {
            return;
        };

        let chat_id = message.chat.id.to_string();
        if let Err(e) = self.client.send_message(&chat_id, &reply.to_string()).await {
            error!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }
}

/// Bot API offsets acknowledge everything below them
fn next_offset(current: Option<i64>, update: &Update) -> Option<i64> {
    let candidate = update.update_id + 1;
    Some(current.map_or(candidate, |offset| offset.max(candidate)))
}
