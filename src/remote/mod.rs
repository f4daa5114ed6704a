//! Remote keyed store.
//!
//! The remote holds the shared catalog and a copy of every user's progress.
//! It is reached over HTTP in normal use, or opened directly when the client
//! runs next to the database. Callers treat every failure as "offline" and
//! fall back to local data; see [`crate::progress`] and [`crate::catalog`].

mod http;
mod sqlite;

pub use http::HttpRemote;

use crate::config::{Config, RemoteMode};
use crate::db::Database;
use crate::types::{Reward, Task, UserProgress};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store unreachable: {0}")]
    Unavailable(String),
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response from remote store: {0}")]
    Decode(String),
    #[error("remote store failed: {0}")]
    Store(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Unavailable(err.to_string())
        }
    }
}

/// Operations the progress engine needs from the remote store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Progress for `name`; `Ok(None)` when the store has no such user.
    async fn fetch_user(&self, name: &str) -> Result<Option<UserProgress>, RemoteError>;

    /// Replace the stored document for `progress.name`.
    async fn upsert_user(&self, progress: &UserProgress) -> Result<UserProgress, RemoteError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError>;

    async fn list_rewards(&self) -> Result<Vec<Reward>, RemoteError>;

    /// Persist a task built by the caller (id included). Returns the stored entry.
    async fn create_task(&self, task: &Task) -> Result<Task, RemoteError>;

    /// Persist a reward built by the caller (id included). Returns the stored entry.
    async fn create_reward(&self, reward: &Reward) -> Result<Reward, RemoteError>;
}

/// A remote that is never reachable. Runs the client purely on local data.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteStore for OfflineRemote {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_user(&self, _name: &str) -> Result<Option<UserProgress>, RemoteError> {
        Err(offline())
    }

    async fn upsert_user(&self, _progress: &UserProgress) -> Result<UserProgress, RemoteError> {
        Err(offline())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        Err(offline())
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>, RemoteError> {
        Err(offline())
    }

    async fn create_task(&self, _task: &Task) -> Result<Task, RemoteError> {
        Err(offline())
    }

    async fn create_reward(&self, _reward: &Reward) -> Result<Reward, RemoteError> {
        Err(offline())
    }
}

fn offline() -> RemoteError {
    RemoteError::Unavailable("running offline".to_string())
}

/// Build the remote store selected by `config`.
///
/// An embedded database that cannot be opened degrades to [`OfflineRemote`]
/// so the client keeps working from its cache.
pub fn connect(config: &Config) -> Result<Arc<dyn RemoteStore>, RemoteError> {
    match config.remote.mode() {
        RemoteMode::Offline => Ok(Arc::new(OfflineRemote)),
        RemoteMode::Http(url) => {
            debug!(%url, "Using HTTP remote");
            Ok(Arc::new(HttpRemote::new(url, config.remote.timeout())?))
        }
        RemoteMode::Embedded => {
            let path = &config.server.db_path;
            let opened = config
                .ensure_db_dir()
                .and_then(|()| Database::open(path));
            match opened {
                Ok(db) => {
                    debug!(path = %path.display(), "Using embedded database");
                    Ok(Arc::new(db))
                }
                Err(e) => {
                    warn!(path = %path.display(), "Cannot open database, working offline: {:#}", e);
                    Ok(Arc::new(OfflineRemote))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn offline_remote_is_unavailable() {
        let remote = OfflineRemote;
        assert!(matches!(
            remote.fetch_user("aisha").await,
            Err(RemoteError::Unavailable(_))
        ));
        assert!(remote.list_tasks().await.is_err());
    }

    #[test]
    fn connect_picks_mode() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.db_path = temp.path().join("nested").join("quests.db");

        assert_eq!(connect(&config).unwrap().name(), "sqlite");
        assert!(config.server.db_path.exists());

        config.remote.url = Some("http://127.0.0.1:3001".into());
        assert_eq!(connect(&config).unwrap().name(), "http");

        config.remote.offline = true;
        assert_eq!(connect(&config).unwrap().name(), "offline");
    }
}
