//! Sonarr integration
//!
//! The webhook pipeline talks to the library manager through the
//! [`LibraryManager`] trait. [`SonarrLibraryManager`] is the HTTP
//! implementation; [`fake::FakeLibraryManager`] records requests for tests.
//!
//! The deletion workflow is best effort. Every step's failure is turned into
//! a [`DeletionOutcome`] and logged here, so callers never see an error:
//!
//! 1. find the series by title (case-insensitive, exact)
//! 2. find the episode by season and episode number
//! 3. delete the episode file, if there is one
//! 4. unmonitor the episode, if `unmonitor_after_delete` is set

pub mod client;
pub mod fake;
pub mod types;

pub use client::SonarrClient;
pub use types::{DeletionOutcome, EpisodeRef, EpisodeResource, SeriesResource};

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Remote library manager able to delete watched episodes
#[async_trait]
pub trait LibraryManager: Send + Sync {
    /// Run the deletion workflow for `target` using the connection settings
    /// and unmonitor flag from `config`
    async fn delete_episode(&self, target: &EpisodeRef, config: &Config) -> DeletionOutcome;
}

/// [`LibraryManager`] backed by the Sonarr v3 API
///
/// A fresh [`SonarrClient`] is built from the config snapshot on every call,
/// so a reloaded URL or API key applies to the next deletion.
#[derive(Debug, Clone, Default)]
pub struct SonarrLibraryManager {
    http: reqwest::Client,
}

impl SonarrLibraryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing HTTP client (shares its connection pool)
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LibraryManager for SonarrLibraryManager {
    async fn delete_episode(&self, target: &EpisodeRef, config: &Config) -> DeletionOutcome {
        let Some(sonarr) = config.sonarr.as_ref() else {
            error!(episode = %target, "Sonarr is not configured; cannot delete");
            return DeletionOutcome::Failed("Sonarr is not configured".to_string());
        };

        let client = SonarrClient::new(self.http.clone(), sonarr);
        match run_deletion(&client, target, config.unmonitor_after_delete).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(episode = %target, "Error handling deletion: {:#}", e);
                DeletionOutcome::Failed(format!("{:#}", e))
            }
        }
    }
}

/// The four-step workflow; any remote failure aborts at that step
pub async fn run_deletion(
    client: &SonarrClient,
    target: &EpisodeRef,
    unmonitor: bool,
) -> Result<DeletionOutcome> {
    let Some(series) = client.find_series(&target.series).await? else {
        warn!(series = %target.series, "Series not found in Sonarr");
        return Ok(DeletionOutcome::SeriesNotFound);
    };

    let Some(mut episode) = client
        .find_episode(series.id, target.season, target.episode)
        .await?
    else {
        warn!(
            series = %target.series,
            series_id = series.id,
            "Episode not found in Sonarr: S{}E{}",
            target.season,
            target.episode
        );
        return Ok(DeletionOutcome::EpisodeNotFound);
    };

    let file_deleted = if episode.has_file {
        client.delete_episode_file(episode.episode_file_id).await?;
        info!(
            episode_file_id = episode.episode_file_id,
            "Deleted {}", target
        );
        true
    } else {
        info!("No file to delete for {}", target);
        false
    };

    let unmonitored = if unmonitor {
        episode.monitored = false;
        client.update_episode(&episode).await?;
        info!(episode_id = episode.id, "Unmonitored {}", target);
        true
    } else {
        false
    };

    Ok(DeletionOutcome::Deleted {
        file_deleted,
        unmonitored,
    })
}
