//! Chat commands and handlers
use std::fmt;
use tracing::{error, info};

use crate::domain::wallet::SharedWalletStore;
use crate::shared::types::TonBalance;
use crate::shared::utils::format_amount;

/// Inbound chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/add <address>`
    Track(Option<String>),
    /// `/remove <address>`
    Untrack(Option<String>),
    /// `/list`
    List,
    /// `/help`, `/start`
    Help,
    /// Any other slash command
    Unknown(String),
}

impl Command {
    /// Parse a message text. Text that is not a slash command yields `None`.
    ///
    /// The argument is everything after the first space, trimmed.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim_start();
        let body = text.strip_prefix('/')?;

        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (body, ""),
        };
        // Group chats address commands as `/add@SomeBot`.
        let name = name.split('@').next().unwrap_or_default().to_lowercase();

        let argument = Some(rest.trim())
            .filter(|arg| !arg.is_empty())
            .map(str::to_string);

        let command = match name.as_str() {
            "add" | "track" => Command::Track(argument),
            "remove" | "untrack" => Command::Untrack(argument),
            "list" => Command::List,
            "help" | "start" => Command::Help,
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

/// Reply sent back to whoever issued the command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Tracked(String),
    AlreadyTracked(String),
    Untracked(String),
    NotFound(String),
    MissingAddress(&'static str),
    SaveFailed { address: String, adding: bool },
    Wallets(Vec<(String, TonBalance)>),
    Help,
    Unknown(String),
}

const HELP_TEXT: &str = "Commands:\n\
/add <address> - start tracking a wallet\n\
/remove <address> - stop tracking a wallet\n\
/list - show tracked wallets";

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandReply::Tracked(address) => write!(f, "Wallet {} added for tracking.", address),
            CommandReply::AlreadyTracked(address) => {
                write!(f, "Wallet {} is already tracked.", address)
            }
            CommandReply::Untracked(address) => {
                write!(f, "Wallet {} successfully removed from tracking.", address)
            }
            CommandReply::NotFound(address) if address.is_empty() => {
                write!(f, "Wallet not found in the tracking list.")
            }
            CommandReply::NotFound(address) => {
                write!(f, "Wallet {} not found in the tracking list.", address)
            }
            CommandReply::MissingAddress(command) => write!(f, "Usage: /{} <address>", command),
            CommandReply::SaveFailed { address, adding: true } => {
                write!(f, "Error while adding wallet {}.", address)
            }
            CommandReply::SaveFailed { address, adding: false } => {
                write!(f, "Error while removing wallet {}.", address)
            }
            CommandReply::Wallets(wallets) if wallets.is_empty() => {
                write!(f, "No wallets are tracked.")
            }
            CommandReply::Wallets(wallets) => {
                write!(f, "Tracked wallets:")?;
                for (address, balance) in wallets {
                    write!(f, "\n{}: {} TON", address, format_amount(*balance))?;
                }
                Ok(())
            }
            CommandReply::Help => write!(f, "{}", HELP_TEXT),
            CommandReply::Unknown(name) => {
                write!(f, "Unknown command /{}.\n\n{}", name, HELP_TEXT)
            }
        }
    }
}

/// Executes commands against the shared wallet store
#[derive(Clone)]
pub struct CommandHandler {
    store: SharedWalletStore,
}

impl CommandHandler {
    pub fn new(store: SharedWalletStore) -> Self {
        Self { store }
    }

    /// Parse and execute a message. `None` when the text is not a command.
    pub async fn handle_text(&self, text: &str) -> Option<CommandReply> {
        let command = Command::parse(text)?;
        Some(self.execute(command).await)
    }

    pub async fn execute(&self, command: Command) -> CommandReply {
        match command {
            Command::Track(Some(address)) => self.track(address).await,
            Command::Track(None) => CommandReply::MissingAddress("add"),
            Command::Untrack(Some(address)) => self.untrack(address).await,
            Command::Untrack(None) => {
                info!("Attempted to remove a wallet without an address");
                CommandReply::NotFound(String::new())
            }
            Command::List => self.list().await,
            Command::Help => CommandReply::Help,
            Command::Unknown(name) => CommandReply::Unknown(name),
        }
    }

    /// Start tracking at balance 0 and persist
    pub async fn track(&self, address: String) -> CommandReply {
        let mut store = self.store.lock().await;
        if !store.insert_new(&address) {
            info!("Wallet {} is already tracked", address);
            return CommandReply::AlreadyTracked(address);
        }

        if store.persist() {
            info!("Added wallet {}", address);
            CommandReply::Tracked(address)
        } else {
            error!("Failed to add wallet {}", address);
            CommandReply::SaveFailed { address, adding: true }
        }
    }

    /// Stop tracking and persist
    pub async fn untrack(&self, address: String) -> CommandReply {
        let mut store = self.store.lock().await;
        if !store.remove(&address) {
            info!("Attempted to remove non-existent wallet: {}", address);
            return CommandReply::NotFound(address);
        }

        if store.persist() {
            info!("Removed wallet {}", address);
            CommandReply::Untracked(address)
        } else {
            error!("Failed to remove wallet {}", address);
            CommandReply::SaveFailed { address, adding: false }
        }
    }

    pub async fn list(&self) -> CommandReply {
        let store = self.store.lock().await;
        CommandReply::Wallets(
            store
                .iter()
                .map(|(address, balance)| (address.clone(), *balance))
                .collect(),
        )
    }
}
