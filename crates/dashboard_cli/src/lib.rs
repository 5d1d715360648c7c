//! Webhook dashboard CLI library exports.
//!
//! The binary in `main.rs` parses arguments and delegates to the command
//! modules here, which are also used directly by tests.

pub mod commands;
pub mod config;
pub mod errors;
pub mod output;
