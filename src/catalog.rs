//! Task and reward catalog loading.
//!
//! The catalog comes from the remote store when it has data, otherwise from
//! the starter catalog embedded at build time. Admin additions are applied
//! locally first and pushed to the remote on a best-effort basis. Additions
//! that miss the remote are kept as a pending catalog in the local cache and
//! retried by [`push_pending`].

use crate::error::{ApiError, ApiResult};
use crate::remote::{RemoteError, RemoteStore};
use crate::types::{NewReward, NewTask, Reward, Task};
use crate::validate;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Starter catalog shipped with the binary.
const DEFAULT_CATALOG_YAML: &str = include_str!("../defaults/catalog.yaml");

/// Tasks and rewards available to every user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

/// Where the catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Remote,
    Defaults,
}

/// Result of [`load_catalog`].
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub source: CatalogSource,
    /// True when the remote could not be reached.
    pub offline: bool,
}

/// An admin addition and whether it reached the remote store.
#[derive(Debug, Clone)]
pub struct Added<T> {
    pub entry: T,
    pub synced: bool,
}

impl Catalog {
    /// The starter catalog.
    pub fn defaults() -> Result<Self> {
        serde_yaml::from_str(DEFAULT_CATALOG_YAML).context("parsing built-in catalog")
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.rewards.is_empty()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn reward(&self, reward_id: &str) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.id == reward_id)
    }

    /// Append the entries of `other` whose ids are not taken yet.
    /// Returns how many entries were appended.
    pub fn merge(&mut self, other: &Catalog) -> usize {
        let mut appended = 0;
        for task in &other.tasks {
            if self.task(&task.id).is_none() {
                self.tasks.push(task.clone());
                appended += 1;
            }
        }
        for reward in &other.rewards {
            if self.reward(&reward.id).is_none() {
                self.rewards.push(reward.clone());
                appended += 1;
            }
        }
        appended
    }

    /// Add a task locally, then try to persist it remotely.
    ///
    /// Fails with `AlreadyExists` when the id is taken locally or the remote
    /// already holds it; the catalog is left unchanged in both cases.
    pub async fn add_task(
        &mut self,
        input: &NewTask,
        remote: &dyn RemoteStore,
    ) -> ApiResult<Added<Task>> {
        let task = validate::task(input, || temp_id('t'))?;
        if self.task(&task.id).is_some() {
            return Err(ApiError::already_exists("Task", &task.id));
        }
        self.tasks.push(task.clone());

        match remote.create_task(&task).await {
            Ok(saved) => {
                if let Some(slot) = self.tasks.iter_mut().rev().find(|t| t.id == task.id) {
                    *slot = saved.clone();
                }
                info!(task = %saved.id, "Task added");
                Ok(Added {
                    entry: saved,
                    synced: true,
                })
            }
            Err(e) if is_conflict(&e) => {
                self.tasks.retain(|t| t.id != task.id);
                Err(ApiError::already_exists("Task", &task.id))
            }
            Err(e) => {
                warn!(task = %task.id, "Failed to save task to remote, keeping local copy: {}", e);
                Ok(Added {
                    entry: task,
                    synced: false,
                })
            }
        }
    }

    /// Add a reward locally, then try to persist it remotely. Same id rules
    /// as [`Catalog::add_task`].
    pub async fn add_reward(
        &mut self,
        input: &NewReward,
        remote: &dyn RemoteStore,
    ) -> ApiResult<Added<Reward>> {
        let reward = validate::reward(input, || temp_id('r'))?;
        if self.reward(&reward.id).is_some() {
            return Err(ApiError::already_exists("Reward", &reward.id));
        }
        self.rewards.push(reward.clone());

        match remote.create_reward(&reward).await {
            Ok(saved) => {
                if let Some(slot) = self.rewards.iter_mut().rev().find(|r| r.id == reward.id) {
                    *slot = saved.clone();
                }
                info!(reward = %saved.id, "Reward added");
                Ok(Added {
                    entry: saved,
                    synced: true,
                })
            }
            Err(e) if is_conflict(&e) => {
                self.rewards.retain(|r| r.id != reward.id);
                Err(ApiError::already_exists("Reward", &reward.id))
            }
            Err(e) => {
                warn!(reward = %reward.id, "Failed to save reward to remote, keeping local copy: {}", e);
                Ok(Added {
                    entry: reward,
                    synced: false,
                })
            }
        }
    }
}

fn temp_id(prefix: char) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp_millis())
}

fn is_conflict(err: &RemoteError) -> bool {
    matches!(err, RemoteError::Status { status: 409, .. })
}

/// Retry remote creation of additions that missed the remote earlier.
///
/// Returns the entries that are still pending. An entry whose id the remote
/// already holds is dropped: the remote copy wins.
pub async fn push_pending(pending: Catalog, remote: &dyn RemoteStore) -> Catalog {
    let mut left = Catalog::default();

    for task in pending.tasks {
        match remote.create_task(&task).await {
            Ok(saved) => info!(task = %saved.id, "Pending task saved to remote"),
            Err(e) if is_conflict(&e) => {
                warn!(task = %task.id, "Dropping pending task, the remote already has this id")
            }
            Err(e) => {
                debug!(task = %task.id, "Task still pending: {}", e);
                left.tasks.push(task);
            }
        }
    }
    for reward in pending.rewards {
        match remote.create_reward(&reward).await {
            Ok(saved) => info!(reward = %saved.id, "Pending reward saved to remote"),
            Err(e) if is_conflict(&e) => {
                warn!(reward = %reward.id, "Dropping pending reward, the remote already has this id")
            }
            Err(e) => {
                debug!(reward = %reward.id, "Reward still pending: {}", e);
                left.rewards.push(reward);
            }
        }
    }
    left
}

/// Fetch tasks and rewards concurrently, falling back to the starter catalog.
///
/// Both collections empty means a store that was never seeded: the defaults
/// are used but the remote still counts as online.
pub async fn load_catalog(remote: &dyn RemoteStore) -> Result<LoadedCatalog> {
    let (tasks, rewards) = tokio::join!(remote.list_tasks(), remote.list_rewards());

    match (tasks, rewards) {
        (Ok(tasks), Ok(rewards)) if tasks.is_empty() && rewards.is_empty() => {
            info!("Remote catalog empty, using starter catalog");
            Ok(LoadedCatalog {
                catalog: Catalog::defaults()?,
                source: CatalogSource::Defaults,
                offline: false,
            })
        }
        (Ok(tasks), Ok(rewards)) => Ok(LoadedCatalog {
            catalog: Catalog { tasks, rewards },
            source: CatalogSource::Remote,
            offline: false,
        }),
        (tasks, rewards) => {
            if let Err(e) = tasks.as_ref() {
                warn!("Failed to fetch tasks, using starter catalog: {}", e);
            }
            if let Err(e) = rewards.as_ref() {
                warn!("Failed to fetch rewards, using starter catalog: {}", e);
            }
            Ok(LoadedCatalog {
                catalog: Catalog::defaults()?,
                source: CatalogSource::Defaults,
                offline: true,
            })
        }
    }
}
