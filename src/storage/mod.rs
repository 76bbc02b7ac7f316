use crate::error::{Result, SweeparrError};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod types;
pub use types::{RecordOutcome, WatchedEvent};

/// Append-only store of watched episodes
///
/// A connection is opened for each operation and dropped when it returns,
/// so no handle or transaction is held across webhook requests.
#[derive(Debug, Clone)]
pub struct WatchedStore {
    db_path: PathBuf,
}

impl WatchedStore {
    /// Open the store at `db_path`, creating the schema if needed
    ///
    /// # Examples
    ///
    /// ```
    /// use sweeparr::storage::WatchedStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = WatchedStore::new(dir.path().join("watched.db")).unwrap();
    /// assert_eq!(store.count().unwrap(), 0);
    /// ```
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| SweeparrError::Storage(e.to_string()))?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Create the schema when the database file is absent or empty
    ///
    /// An existing non-empty file is assumed to already hold the schema.
    pub fn init(&self) -> Result<()> {
        let should_create = std::fs::metadata(&self.db_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let conn = self.open()?;

        if should_create {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS watched (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    rating_key TEXT UNIQUE,
                    series TEXT,
                    season INTEGER,
                    episode INTEGER,
                    watched_at INTEGER
                )",
                [],
            )
            .context("Failed to create tables")
            .map_err(|e| SweeparrError::Storage(e.to_string()))?;

            tracing::info!(path = %self.db_path.display(), "Initialized new watched database");
        }

        Ok(())
    }

    /// Record a watched event
    ///
    /// A second event with the same rating key is ignored: the stored
    /// season, episode, and timestamp of the first event are kept.
    ///
    /// # Arguments
    ///
    /// * `event` - The scrobbled episode; a `None` rating key always inserts
    ///
    /// # Returns
    ///
    /// [`RecordOutcome::Inserted`] for a new row,
    /// [`RecordOutcome::Duplicate`] when the rating key was already stored
    ///
    /// # Errors
    ///
    /// Returns [`SweeparrError::Storage`](crate::error::SweeparrError::Storage)
    /// if the database cannot be opened or written.
    pub fn record(&self, event: &WatchedEvent) -> Result<RecordOutcome> {
        let conn = self.open()?;

        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO watched (rating_key, series, season, episode, watched_at)
                VALUES (?, ?, ?, ?, ?)",
                params![
                    event.rating_key,
                    event.series,
                    event.season,
                    event.episode,
                    event.watched_at
                ],
            )
            .context("Failed to insert watched event")
            .map_err(|e| SweeparrError::Storage(e.to_string()))?;

        Ok(if changed == 0 {
            RecordOutcome::Duplicate
        } else {
            RecordOutcome::Inserted
        })
    }

    /// Look up the event stored for a rating key
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or queried.
    pub fn get(&self, rating_key: &str) -> Result<Option<WatchedEvent>> {
        let conn = self.open()?;

        conn.query_row(
            "SELECT rating_key, series, season, episode, watched_at
            FROM watched WHERE rating_key = ?",
            params![rating_key],
            row_to_event,
        )
        .optional()
        .context("Failed to query watched event")
        .map_err(|e| SweeparrError::Storage(e.to_string()).into())
    }

    /// Most recently watched events first
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of rows to return
    pub fn list_recent(&self, limit: usize) -> Result<Vec<WatchedEvent>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT rating_key, series, season, episode, watched_at
                FROM watched
                ORDER BY watched_at DESC, id DESC
                LIMIT ?",
            )
            .context("Failed to prepare query")
            .map_err(|e| SweeparrError::Storage(e.to_string()))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], row_to_event)
            .context("Failed to query watched events")
            .map_err(|e| SweeparrError::Storage(e.to_string()))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(
                row.context("Failed to read watched event")
                    .map_err(|e| SweeparrError::Storage(e.to_string()))?,
            );
        }

        Ok(events)
    }

    /// Number of stored events
    pub fn count(&self) -> Result<u64> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row("SELECT count(*) FROM watched", [], |r| r.get(0))
            .context("Failed to count watched events")
            .map_err(|e| SweeparrError::Storage(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| SweeparrError::Storage(e.to_string()).into())
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<WatchedEvent> {
    Ok(WatchedEvent {
        rating_key: row.get(0)?,
        series: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        season: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        episode: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        watched_at: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
    })
}
