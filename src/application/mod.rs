//! Application layer - use cases and services

pub mod command_listener;
pub mod commands;
pub mod reconciler;
pub mod scheduler;

pub use command_listener::CommandListener;
pub use commands::{Command, CommandHandler, CommandReply};
pub use reconciler::{PassReport, Reconciler};
pub use scheduler::Scheduler;
