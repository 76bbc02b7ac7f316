//! In-process fake library manager
//!
//! [`FakeLibraryManager`] records every deletion request and answers with a
//! preset [`DeletionOutcome`], so the webhook pipeline can be tested without
//! a Sonarr instance.
//!
//! ```
//! use sweeparr::config::Config;
//! use sweeparr::sonarr::fake::FakeLibraryManager;
//! use sweeparr::sonarr::{DeletionOutcome, EpisodeRef, LibraryManager};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fake = FakeLibraryManager::new();
//! let outcome = fake
//!     .delete_episode(&EpisodeRef::new("Foo", 1, 2), &Config::default())
//!     .await;
//!
//! assert!(matches!(outcome, DeletionOutcome::Deleted { .. }));
//! assert_eq!(fake.calls(), vec![EpisodeRef::new("Foo", 1, 2)]);
//! # }
//! ```

use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Config;
use crate::sonarr::{DeletionOutcome, EpisodeRef, LibraryManager};

/// Recording [`LibraryManager`] for tests
#[derive(Debug)]
pub struct FakeLibraryManager {
    calls: Mutex<Vec<EpisodeRef>>,
    outcome: DeletionOutcome,
}

impl FakeLibraryManager {
    /// Fake that reports every deletion as successful
    pub fn new() -> Self {
        Self::with_outcome(DeletionOutcome::Deleted {
            file_deleted: true,
            unmonitored: true,
        })
    }

    /// Fake that answers every request with `outcome`
    pub fn with_outcome(outcome: DeletionOutcome) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome,
        }
    }

    /// Requests received so far, oldest first
    pub fn calls(&self) -> Vec<EpisodeRef> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for FakeLibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryManager for FakeLibraryManager {
    async fn delete_episode(&self, target: &EpisodeRef, _config: &Config) -> DeletionOutcome {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(target.clone()),
            Err(poisoned) => poisoned.into_inner().push(target.clone()),
        }
        self.outcome.clone()
    }
}
