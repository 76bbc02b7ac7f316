//! Sonarr v3 API resources
//!
//! Only the fields the deletion workflow reads are typed. Episodes keep every
//! other field in `extra` because the unmonitor step sends the whole object
//! back with `PUT /api/v3/episode/{id}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry from `GET /api/v3/series`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResource {
    pub id: i64,
    pub title: String,
}

/// Entry from `GET /api/v3/episode?seriesId={id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeResource {
    pub id: i64,
    #[serde(default)]
    pub series_id: i64,
    /// `0` when the episode has no file
    #[serde(default)]
    pub episode_file_id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub monitored: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The episode a deletion is requested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub series: String,
    pub season: i64,
    pub episode: i64,
}

impl EpisodeRef {
    pub fn new(series: impl Into<String>, season: i64, episode: i64) -> Self {
        Self {
            series: series.into(),
            season,
            episode,
        }
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} S{}E{}", self.series, self.season, self.episode)
    }
}

/// Result of the deletion workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Episode found; its file was deleted (if it had one) and it was
    /// unmonitored (if configured)
    Deleted { file_deleted: bool, unmonitored: bool },
    /// No series with a matching title
    SeriesNotFound,
    /// Series found but it has no matching season/episode
    EpisodeNotFound,
    /// A remote call failed; later steps were skipped
    Failed(String),
}
