//! Messenger-agnostic outbound port. Telegram implements it today.

pub mod port;
pub mod types;
