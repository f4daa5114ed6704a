//! Progress store adapter.
//!
//! Reads and writes a user's progress against the remote store with the
//! local cache as the durable copy:
//!
//! - `load`: remote first (mirrored into the cache), then cache, then a fresh
//!   zero-state record which is saved immediately.
//! - `save`: cache first, then a best-effort remote upsert. Never fails.
//! - `import_code`: decode a magic code and save it under the importing name.

use crate::cache::LocalCache;
use crate::remote::RemoteStore;
use crate::sync_code::{self, InvalidCodeError};
use crate::types::UserProgress;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a loaded record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    Remote,
    Cache,
    /// No record anywhere; a zero-state record was created.
    Fresh,
}

/// Result of [`ProgressStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedProgress {
    pub progress: UserProgress,
    pub source: ProgressSource,
    /// Whether the remote store could not be reached while loading.
    pub offline: bool,
}

/// Result of [`ProgressStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// Cached locally and stored remotely.
    Synced,
    /// Cached locally; the remote write failed and is pending.
    LocalOnly,
    /// Neither write succeeded. The in-memory state is all there is.
    Unsaved,
}

impl SaveStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, SaveStatus::Synced)
    }
}

/// Reads and writes progress records through the remote store and local cache.
#[derive(Clone)]
pub struct ProgressStore {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
}

impl ProgressStore {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        Self { remote, cache }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    /// Load progress for `name`, falling back to the cache and then to a
    /// fresh record.
    pub async fn load(&self, name: &str) -> LoadedProgress {
        let offline = match self.remote.fetch_user(name).await {
            Ok(Some(progress)) => {
                debug!(user = %name, remote = self.remote.name(), "Loaded progress from remote");
                if let Err(e) = self.cache.store_progress(&progress) {
                    warn!(user = %name, "Failed to mirror progress into cache: {:#}", e);
                }
                return LoadedProgress {
                    progress,
                    source: ProgressSource::Remote,
                    offline: false,
                };
            }
            Ok(None) => {
                debug!(user = %name, "No remote progress, checking cache");
                false
            }
            Err(e) => {
                warn!(user = %name, "Failed to fetch progress, falling back to cache: {}", e);
                true
            }
        };

        match self.cache.progress(name) {
            Ok(Some(progress)) => {
                return LoadedProgress {
                    progress,
                    source: ProgressSource::Cache,
                    offline,
                };
            }
            Ok(None) => {}
            Err(e) => warn!(user = %name, "Cached progress unreadable: {:#}", e),
        }

        info!(user = %name, "Starting fresh progress");
        let progress = UserProgress::new(name);
        let status = self.save(&progress).await;
        LoadedProgress {
            progress,
            source: ProgressSource::Fresh,
            offline: offline || !status.is_synced(),
        }
    }

    /// Save progress: cache first, then remote. Failures are logged, not returned.
    pub async fn save(&self, progress: &UserProgress) -> SaveStatus {
        let cached = match self.cache.store_progress(progress) {
            Ok(()) => true,
            Err(e) => {
                warn!(user = %progress.name, "Local cache save error: {:#}", e);
                false
            }
        };

        match self.remote.upsert_user(progress).await {
            Ok(_) => {
                debug!(user = %progress.name, "Progress saved to remote");
                SaveStatus::Synced
            }
            Err(e) => {
                warn!(user = %progress.name, "Failed to save progress to remote: {}", e);
                if cached {
                    SaveStatus::LocalOnly
                } else {
                    SaveStatus::Unsaved
                }
            }
        }
    }

    /// Magic code for `name`'s progress, taken from the cache (or loaded).
    pub async fn export_code(&self, name: &str) -> Result<String> {
        let progress = match self.cache.progress(name) {
            Ok(Some(progress)) => progress,
            Ok(None) => self.load(name).await.progress,
            Err(e) => {
                warn!(user = %name, "Cached progress unreadable, reloading: {:#}", e);
                self.load(name).await.progress
            }
        };
        Ok(sync_code::encode(&progress)?)
    }

    /// Replace `target_name`'s progress with the record in `code`.
    ///
    /// Nothing is written when the code is rejected.
    pub async fn import_code(
        &self,
        code: &str,
        target_name: &str,
    ) -> Result<(UserProgress, SaveStatus), InvalidCodeError> {
        let progress = sync_code::decode(code, target_name)?;
        info!(user = %progress.name, points = progress.points, "Importing progress from magic code");
        let status = self.save(&progress).await;
        Ok((progress, status))
    }
}
