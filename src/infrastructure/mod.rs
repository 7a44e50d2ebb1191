//! Infrastructure layer - external service clients

pub mod blockchain;
pub mod telegram;
