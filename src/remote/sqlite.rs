//! Direct access to a local database as the remote store.

use super::{RemoteError, RemoteStore};
use crate::db::Database;
use crate::error::ApiError;
use crate::types::{NewReward, NewTask, Reward, Task, UserProgress};
use async_trait::async_trait;

impl From<anyhow::Error> for RemoteError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => RemoteError::Status {
                status: api_err.code.status().as_u16(),
                body: api_err.message,
            },
            Err(err) => RemoteError::Store(err.to_string()),
        }
    }
}

#[async_trait]
impl RemoteStore for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_user(&self, name: &str) -> Result<Option<UserProgress>, RemoteError> {
        Ok(self.get_user(name)?)
    }

    async fn upsert_user(&self, progress: &UserProgress) -> Result<UserProgress, RemoteError> {
        Ok(Database::upsert_user(self, progress)?)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        Ok(Database::list_tasks(self)?)
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>, RemoteError> {
        Ok(Database::list_rewards(self)?)
    }

    async fn create_task(&self, task: &Task) -> Result<Task, RemoteError> {
        let input = NewTask {
            id: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            kind: task.kind,
            duration_days: task.duration_days,
            points: task.points,
        };
        Ok(Database::create_task(self, &input)?)
    }

    async fn create_reward(&self, reward: &Reward) -> Result<Reward, RemoteError> {
        let input = NewReward {
            id: Some(reward.id.clone()),
            title: reward.title.clone(),
            kind: reward.kind,
            content: reward.content.clone(),
            cost: reward.cost,
        };
        Ok(Database::create_reward(self, &input)?)
    }
}
