//! Login session: the current user, their progress, and the catalog.
//!
//! A `Session` is created by `login` (or `resume`, which reads the
//! `currentUser` cache key) and owns everything the CLI needs to complete
//! tasks, buy and open rewards, and move progress between devices.

use crate::catalog::{Added, Catalog, CatalogSource, load_catalog, push_pending};
use crate::engine::{
    CompletionOutcome, PurchaseOutcome, complete_task_with_outcome, purchase_reward_with_outcome,
};
use crate::error::{ApiError, ApiResult};
use crate::progress::{ProgressSource, ProgressStore, SaveStatus};
use crate::story::StoryGenerator;
use crate::types::{NewReward, NewTask, Reward, RewardKind, Task, UserProgress};
use crate::validate;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// Services a session runs against.
#[derive(Clone)]
pub struct SessionContext {
    pub store: ProgressStore,
    /// Shared password guarding catalog additions.
    pub admin_password: String,
}

impl SessionContext {
    pub fn new(store: ProgressStore, admin_password: impl Into<String>) -> Self {
        Self {
            store,
            admin_password: admin_password.into(),
        }
    }
}

/// An engine outcome plus how the resulting progress was persisted.
///
/// `saved` is `None` when the outcome left the progress unchanged.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Applied<O> {
    #[serde(flatten)]
    pub outcome: O,
    pub saved: Option<SaveStatus>,
}

/// What opening an owned reward reveals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum RewardContent {
    Text(String),
    /// Image URL.
    Image(String),
    Story(String),
}

impl RewardContent {
    pub fn body(&self) -> &str {
        match self {
            RewardContent::Text(s) | RewardContent::Image(s) | RewardContent::Story(s) => s,
        }
    }
}

pub struct Session {
    ctx: SessionContext,
    progress: UserProgress,
    progress_source: ProgressSource,
    catalog: Catalog,
    catalog_source: CatalogSource,
    offline: bool,
}

impl Session {
    /// Start a session for `name`: remember it as the current user, then load
    /// the catalog and the user's progress.
    pub async fn login(name: &str, ctx: SessionContext) -> ApiResult<Session> {
        let name = validate::user_name(Some(name))?;
        if let Err(e) = ctx.store.cache().set_current_user(&name) {
            warn!(user = %name, "Failed to remember current user: {:#}", e);
        }

        let remote = ctx.store.remote().clone();
        let mut loaded_catalog = load_catalog(remote.as_ref()).await?;
        let pending = ctx.store.cache().pending_catalog().unwrap_or_else(|e| {
            warn!("Ignoring unreadable pending catalog: {:#}", e);
            Catalog::default()
        });
        if !pending.is_empty() {
            loaded_catalog.catalog.merge(&pending);
            let left = if loaded_catalog.offline {
                pending
            } else {
                push_pending(pending, remote.as_ref()).await
            };
            if let Err(e) = ctx.store.cache().store_pending_catalog(&left) {
                warn!("Failed to update pending catalog: {:#}", e);
            }
        }

        let loaded = ctx.store.load(&name).await;
        info!(
            user = %name,
            points = loaded.progress.points,
            source = ?loaded.source,
            catalog = ?loaded_catalog.source,
            "Logged in"
        );

        Ok(Session {
            offline: loaded.offline || loaded_catalog.offline,
            progress: loaded.progress,
            progress_source: loaded.source,
            catalog: loaded_catalog.catalog,
            catalog_source: loaded_catalog.source,
            ctx,
        })
    }

    /// Resume the session of the remembered current user, if any.
    pub async fn resume(ctx: SessionContext) -> ApiResult<Option<Session>> {
        let current = ctx.store.cache().current_user().map_err(ApiError::internal)?;
        match current {
            Some(name) => Ok(Some(Self::login(&name, ctx).await?)),
            None => Ok(None),
        }
    }

    /// Forget the current user. Returns whether anyone was logged in.
    pub fn logout(ctx: &SessionContext) -> ApiResult<bool> {
        let cleared = ctx
            .store
            .cache()
            .clear_current_user()
            .map_err(ApiError::internal)?;
        if cleared {
            info!("Logged out");
        }
        Ok(cleared)
    }

    pub fn user(&self) -> &str {
        &self.progress.name
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn progress_source(&self) -> ProgressSource {
        self.progress_source
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_source(&self) -> CatalogSource {
        self.catalog_source
    }

    /// Whether the remote store was unreachable at some point this session.
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    async fn persist(&mut self, next: UserProgress) -> SaveStatus {
        let status = self.ctx.store.save(&next).await;
        if !status.is_synced() {
            self.offline = true;
        }
        self.progress = next;
        status
    }

    /// Mark `task_id` done on `today`. Unknown task ids change nothing.
    pub async fn complete_task(
        &mut self,
        task_id: &str,
        today: NaiveDate,
    ) -> Option<Applied<CompletionOutcome>> {
        let Some(task) = self.catalog.task(task_id) else {
            warn!(task = %task_id, "Ignoring completion of unknown task");
            return None;
        };
        let (next, outcome) = complete_task_with_outcome(&self.progress, task, today);
        let saved = if outcome.changed() {
            Some(self.persist(next).await)
        } else {
            None
        };
        info!(user = %self.user(), task = %task_id, ?outcome, "Task completion");
        Some(Applied { outcome, saved })
    }

    pub async fn purchase_reward(&mut self, reward_id: &str) -> ApiResult<Applied<PurchaseOutcome>> {
        let reward = self
            .catalog
            .reward(reward_id)
            .ok_or_else(|| ApiError::reward_not_found(reward_id))?;
        let (next, outcome) = purchase_reward_with_outcome(&self.progress, reward);
        let saved = match outcome {
            PurchaseOutcome::Purchased { .. } => Some(self.persist(next).await),
            _ => None,
        };
        info!(user = %self.user(), reward = %reward_id, ?outcome, "Reward purchase");
        Ok(Applied { outcome, saved })
    }

    /// Reveal an owned reward. Story rewards are generated on demand.
    pub async fn open_reward(
        &self,
        reward_id: &str,
        your_name: &str,
        generator: &dyn StoryGenerator,
    ) -> ApiResult<RewardContent> {
        let reward = self
            .catalog
            .reward(reward_id)
            .ok_or_else(|| ApiError::reward_not_found(reward_id))?;
        if !self.progress.owns(&reward.id) {
            return Err(ApiError::not_owned(reward_id));
        }

        Ok(match reward.kind {
            RewardKind::Text => RewardContent::Text(reward.content.clone()),
            RewardKind::Image => RewardContent::Image(reward.content.clone()),
            RewardKind::GeneratedStory => RewardContent::Story(
                generator
                    .generate(&reward.content, self.user(), your_name)
                    .await,
            ),
        })
    }

    /// Magic code for the current user's progress.
    pub async fn export_code(&self) -> ApiResult<String> {
        Ok(self.ctx.store.export_code(self.user()).await?)
    }

    /// Replace the current user's progress with the one in `code`.
    pub async fn import_code(&mut self, code: &str) -> ApiResult<SaveStatus> {
        let (progress, status) = self
            .ctx
            .store
            .import_code(code, self.user())
            .await
            .map_err(ApiError::invalid_code)?;
        if !status.is_synced() {
            self.offline = true;
        }
        self.progress = progress;
        Ok(status)
    }

    fn check_password(&self, password: &str) -> ApiResult<()> {
        if password == self.ctx.admin_password {
            Ok(())
        } else {
            warn!(user = %self.user(), "Rejected admin action: wrong password");
            Err(ApiError::unauthorized())
        }
    }

    /// Record an addition that missed the remote so later sessions see it
    /// and retry it.
    fn keep_pending(&mut self, add: impl FnOnce(&mut Catalog)) -> ApiResult<()> {
        self.offline = true;
        let cache = self.ctx.store.cache();
        let mut pending = cache.pending_catalog().map_err(ApiError::internal)?;
        add(&mut pending);
        cache
            .store_pending_catalog(&pending)
            .map_err(ApiError::internal)
    }

    /// Add a quest. When the remote is unreachable the quest is kept in the
    /// local cache until a later login can push it.
    pub async fn add_task(&mut self, password: &str, input: &NewTask) -> ApiResult<Added<Task>> {
        self.check_password(password)?;
        let remote = self.ctx.store.remote().clone();
        let added = self.catalog.add_task(input, remote.as_ref()).await?;
        if !added.synced {
            let entry = added.entry.clone();
            if let Err(e) = self.keep_pending(|p| p.tasks.push(entry)) {
                self.catalog.tasks.retain(|t| t.id != added.entry.id);
                return Err(e);
            }
        }
        Ok(added)
    }

    pub async fn add_reward(
        &mut self,
        password: &str,
        input: &NewReward,
    ) -> ApiResult<Added<Reward>> {
        self.check_password(password)?;
        let remote = self.ctx.store.remote().clone();
        let added = self.catalog.add_reward(input, remote.as_ref()).await?;
        if !added.synced {
            let entry = added.entry.clone();
            if let Err(e) = self.keep_pending(|p| p.rewards.push(entry)) {
                self.catalog.rewards.retain(|r| r.id != added.entry.id);
                return Err(e);
            }
        }
        Ok(added)
    }
}
