//! Error types for Sweeparr
//!
//! This module defines the error types used throughout the relay,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Sweeparr operations
///
/// Covers configuration loading, the watched-event store, calls to the
/// Sonarr API, and webhook payload decoding. None of these ever reach the
/// media server as an HTTP failure; they surface in logs only.
#[derive(Error, Debug)]
pub enum SweeparrError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Watched-event storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Sonarr API errors (lookup, delete, unmonitor)
    #[error("Sonarr error: {0}")]
    Sonarr(String),

    /// Webhook payload errors (multipart decoding, malformed JSON)
    #[error("Webhook error: {0}")]
    Webhook(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Sweeparr operations
///
/// Uses `anyhow::Error` so call sites can attach context while still
/// wrapping domain failures in [`SweeparrError`].
pub type Result<T> = anyhow::Result<T>;
