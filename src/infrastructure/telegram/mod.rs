//! Telegram messaging

pub mod telegram_client;

pub use telegram_client::{
    BotApi, Chat, Message, TelegramClient, Update, User, DEFAULT_TELEGRAM_API_URL,
};
