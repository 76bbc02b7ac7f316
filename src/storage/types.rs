use serde::{Deserialize, Serialize};

/// A watched episode as reported by the media server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedEvent {
    /// Media server identifier of the episode; the idempotency key
    pub rating_key: Option<String>,
    /// Series title
    pub series: String,
    /// Season number
    pub season: i64,
    /// Episode number within the season
    pub episode: i64,
    /// When the episode was watched (epoch seconds)
    pub watched_at: i64,
}

/// Result of recording a watched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new row was written
    Inserted,
    /// A row with the same rating key already existed; nothing changed
    Duplicate,
}
