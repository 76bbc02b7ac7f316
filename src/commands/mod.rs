//! Command handlers for the CLI
//!
//! - `serve`: run the webhook server (default)
//! - `history`: print recently watched episodes
//! - `check_config`: parse and explain the policy document

pub mod check_config;
pub mod history;
pub mod serve;
