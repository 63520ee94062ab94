//! Core domain + application logic for the Discord GitHub bot.
//!
//! This crate is intentionally framework-agnostic. Discord and the GitHub REST API
//! live behind ports (traits) implemented in adapter crates.

pub mod code_host;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;

pub use errors::{Error, Result};
