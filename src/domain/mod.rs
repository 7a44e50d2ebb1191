//! Domain layer - core business logic and entities

pub mod balance;
pub mod notification;
pub mod wallet;
