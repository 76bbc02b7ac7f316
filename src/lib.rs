//! sweeparr - Plex-to-Sonarr watched-episode relay
//!
//! Receives Plex webhooks, records each watched TV episode once, and asks
//! Sonarr to delete the episode file when the grace period for its series
//! is zero.
//!
//! # Architecture
//!
//! - `server`: axum router, webhook decoding and the event pipeline
//! - `storage`: SQLite log of watched episodes, idempotent on rating key
//! - `policy`: per-series and global grace-period resolution
//! - `sonarr`: library-manager trait and the Sonarr v3 client
//! - `config` / `reload`: policy document and its hot-reloaded snapshot
//! - `cli` / `commands`: command-line entry points
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sweeparr::{AppState, ConfigStore, SonarrLibraryManager, WatchedStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(ConfigStore::new("config.json"));
//!     config.load();
//!     let state = AppState::new(
//!         config,
//!         WatchedStore::new("watched.db")?,
//!         Arc::new(SonarrLibraryManager::new()),
//!     );
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     sweeparr::server::serve(listener, Arc::new(state), std::future::pending()).await
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod policy;
pub mod reload;
pub mod server;
pub mod sonarr;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, SeriesSettings, SonarrConfig};
pub use error::{Result, SweeparrError};
pub use policy::{evaluate, PolicyDecision};
pub use reload::{ConfigStore, ConfigWatchHandle};
pub use server::AppState;
pub use sonarr::{DeletionOutcome, EpisodeRef, LibraryManager, SonarrLibraryManager};
pub use storage::{RecordOutcome, WatchedEvent, WatchedStore};

#[cfg(test)]
pub mod test_utils;
