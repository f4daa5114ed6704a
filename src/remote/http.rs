//! HTTP client for the progress API served by `love-quests serve`.

use super::{RemoteError, RemoteStore};
use crate::types::{Reward, Task, UserProgress};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// Remote store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:3001`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RemoteError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        debug!("remote: GET /api/{path}");
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read(resp).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        debug!("remote: POST /api/{path}");
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::read(resp).await
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_user(&self, name: &str) -> Result<Option<UserProgress>, RemoteError> {
        debug!("remote: GET /api/user?name={name}");
        let resp = self
            .client
            .get(self.url("user"))
            .query(&[("name", name)])
            .send()
            .await?;
        // the API answers `null` for unknown names
        Self::read::<Option<UserProgress>>(resp).await
    }

    async fn upsert_user(&self, progress: &UserProgress) -> Result<UserProgress, RemoteError> {
        self.post("user", progress).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.get("tasks").await
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>, RemoteError> {
        self.get("rewards").await
    }

    async fn create_task(&self, task: &Task) -> Result<Task, RemoteError> {
        self.post("tasks", task).await
    }

    async fn create_reward(&self, reward: &Reward) -> Result<Reward, RemoteError> {
        self.post("rewards", reward).await
    }
}
