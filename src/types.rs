//! Core types for quests, rewards and per-user progress.
//!
//! Field names on the wire follow the JSON documents stored by the earlier
//! web client (`camelCase`, `type`, `duration`), so records and magic codes
//! stay interchangeable with it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a task is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Must be done on `duration_days` distinct days before it pays out.
    Daily,
    /// Pays out the first time it is done.
    Once,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Daily => "daily",
            TaskKind::Once => "once",
        }
    }

    /// Parse a kind name ("daily", "once"). Returns None for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Some(TaskKind::Daily),
            "once" | "one-time" => Some(TaskKind::Once),
            _ => None,
        }
    }
}

/// A quest in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Number of distinct days a daily task must be done. Ignored for `Once`.
    #[serde(rename = "duration")]
    pub duration_days: u32,
    pub points: u32,
}

/// What a reward hands out once purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "image")]
    Image,
    /// Content is a prompt; the reward text is generated when opened.
    #[serde(rename = "gemini-story")]
    GeneratedStory,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Text => "text",
            RewardKind::Image => "image",
            RewardKind::GeneratedStory => "gemini-story",
        }
    }

    /// Parse a kind name. Accepts "story" as shorthand for a generated story.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(RewardKind::Text),
            "image" => Some(RewardKind::Image),
            "gemini-story" | "story" => Some(RewardKind::GeneratedStory),
            _ => None,
        }
    }
}

/// A reward in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    /// Literal text, image URL, or generation prompt depending on `kind`.
    pub content: String,
    pub cost: u32,
}

/// Streak state for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskProgress {
    #[serde(default)]
    pub current_progress: u32,
    #[serde(default)]
    pub completed_dates: BTreeSet<String>,
}

/// A user's whole progress document.
///
/// Missing fields deserialize to their empty values; this is the only place
/// stored records get normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub name: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub completed_tasks: BTreeSet<String>,
    /// Rewards the user has purchased.
    #[serde(default)]
    pub unlocked_rewards: BTreeSet<String>,
    #[serde(default)]
    pub daily_progress: BTreeMap<String, DailyTaskProgress>,
}

impl UserProgress {
    /// Zero state for a name seen for the first time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: 0,
            completed_tasks: BTreeSet::new(),
            unlocked_rewards: BTreeSet::new(),
            daily_progress: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed_tasks.contains(task_id)
    }

    pub fn owns(&self, reward_id: &str) -> bool {
        self.unlocked_rewards.contains(reward_id)
    }

    /// Streak state for a task, if it was ever done.
    pub fn task_progress(&self, task_id: &str) -> Option<&DailyTaskProgress> {
        self.daily_progress.get(task_id)
    }

    /// Whether the task was already marked done on `day`.
    pub fn done_on(&self, task_id: &str, day: &str) -> bool {
        self.daily_progress
            .get(task_id)
            .is_some_and(|p| p.completed_dates.contains(day))
    }
}

/// Admin input for a new task. The id is generated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(rename = "duration", default = "default_duration")]
    pub duration_days: u32,
    #[serde(default)]
    pub points: u32,
}

fn default_duration() -> u32 {
    1
}

/// Admin input for a new reward. The id is generated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReward {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cost: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_uses_web_client_field_names() {
        let task = Task {
            id: "t1".into(),
            title: "Say meow".into(),
            description: "in chat".into(),
            kind: TaskKind::Daily,
            duration_days: 2,
            points: 10,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], "daily");
        assert_eq!(value["duration"], 2);
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn reward_story_kind_serializes_as_gemini_story() {
        let value = serde_json::to_value(RewardKind::GeneratedStory).unwrap();
        assert_eq!(value, json!("gemini-story"));
        assert_eq!(RewardKind::parse("story"), Some(RewardKind::GeneratedStory));
    }

    #[test]
    fn progress_missing_fields_get_defaults() {
        let progress: UserProgress =
            serde_json::from_value(json!({ "name": "aisha", "completedTasks": ["t2"] })).unwrap();
        assert_eq!(progress.points, 0);
        assert!(progress.unlocked_rewards.is_empty());
        assert!(progress.daily_progress.is_empty());
        assert!(progress.is_completed("t2"));
    }

    #[test]
    fn progress_collapses_duplicate_ids() {
        let progress: UserProgress = serde_json::from_value(json!({
            "name": "aisha",
            "points": 5,
            "completedTasks": ["t1", "t1"],
            "unlockedRewards": ["r1", "r1"],
            "dailyProgress": { "t1": { "completedDates": ["Fri Oct 16 2026"], "currentProgress": 1 } }
        }))
        .unwrap();
        assert_eq!(progress.completed_tasks.len(), 1);
        assert_eq!(progress.unlocked_rewards.len(), 1);
        assert!(progress.done_on("t1", "Fri Oct 16 2026"));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!(TaskKind::parse("Daily"), Some(TaskKind::Daily));
        assert_eq!(TaskKind::parse("one-time"), Some(TaskKind::Once));
        assert_eq!(TaskKind::parse("weekly"), None);
        assert_eq!(RewardKind::parse("IMAGE"), Some(RewardKind::Image));
    }
}
