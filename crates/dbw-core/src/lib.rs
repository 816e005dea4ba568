//! Core logic for the domain watch bot.
//!
//! This crate is framework-agnostic: the Telegram transport and the remote
//! status API live behind ports (traits) implemented in adapter crates.

pub mod checker;
pub mod chunker;
pub mod config;
pub mod cycle;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod scheduler;
pub mod security;
pub mod store;

pub use errors::{Error, Result};
