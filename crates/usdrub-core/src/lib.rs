//! Core of the USD/RUB cash rates bot.
//!
//! Extraction of branch offers, aggregation, ranking and paging, the live
//! snapshot store and its refresh scheduler. Chat transports live behind
//! [`messaging::port::MessagingPort`] in adapter crates.

pub mod aggregate;
pub mod branch;
pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod rank;
pub mod scheduler;
pub mod store;

pub use errors::{Error, Result};
