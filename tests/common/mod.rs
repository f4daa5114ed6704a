//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use love_quests::cache::LocalCache;
use love_quests::remote::{RemoteError, RemoteStore};
use love_quests::types::{Reward, Task, UserProgress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory remote that can be switched offline mid-test.
#[derive(Default)]
pub struct FlakyRemote {
    pub down: AtomicBool,
    pub users: Mutex<HashMap<String, UserProgress>>,
    pub tasks: Mutex<Vec<Task>>,
    pub rewards: Mutex<Vec<Reward>>,
    pub upserts: AtomicUsize,
}

impl FlakyRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn user(&self, name: &str) -> Option<UserProgress> {
        self.users.lock().unwrap().get(name).cloned()
    }

    pub fn put_user(&self, progress: UserProgress) {
        self.users
            .lock()
            .unwrap()
            .insert(progress.name.clone(), progress);
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.down.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch_user(&self, name: &str) -> Result<Option<UserProgress>, RemoteError> {
        self.check()?;
        Ok(self.user(name))
    }

    async fn upsert_user(&self, progress: &UserProgress) -> Result<UserProgress, RemoteError> {
        self.check()?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.put_user(progress.clone());
        Ok(progress.clone())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.check()?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>, RemoteError> {
        self.check()?;
        Ok(self.rewards.lock().unwrap().clone())
    }

    async fn create_task(&self, task: &Task) -> Result<Task, RemoteError> {
        self.check()?;
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(conflict(&task.id));
        }
        tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn create_reward(&self, reward: &Reward) -> Result<Reward, RemoteError> {
        self.check()?;
        let mut rewards = self.rewards.lock().unwrap();
        if rewards.iter().any(|r| r.id == reward.id) {
            return Err(conflict(&reward.id));
        }
        rewards.push(reward.clone());
        Ok(reward.clone())
    }
}

fn conflict(id: &str) -> RemoteError {
    RemoteError::Status {
        status: 409,
        body: format!("{} already exists", id),
    }
}

/// A cache in a temporary directory. Keep the `TempDir` alive for the test.
pub fn temp_cache() -> (TempDir, LocalCache) {
    let temp = TempDir::new().unwrap();
    let cache = LocalCache::open(temp.path().join("cache")).unwrap();
    (temp, cache)
}
