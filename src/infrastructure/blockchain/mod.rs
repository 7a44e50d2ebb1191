//! TON blockchain access

pub mod toncenter_client;

pub use toncenter_client::{ToncenterClient, DEFAULT_TONCENTER_ENDPOINT};
