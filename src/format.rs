//! Output formatting for CLI results, as plain text or JSON.

use crate::catalog::Catalog;
use crate::engine::{CompletionOutcome, PurchaseOutcome};
use crate::progress::SaveStatus;
use crate::types::{Reward, Task, TaskKind, UserProgress};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
}

/// One quest with the user's standing on it.
pub fn task_line(task: &Task, progress: &UserProgress, today: &str) -> String {
    let marker = if progress.is_completed(&task.id) {
        "[x]".to_string()
    } else {
        match task.kind {
            TaskKind::Once => "[ ]".to_string(),
            TaskKind::Daily => {
                let current = progress
                    .task_progress(&task.id)
                    .map_or(0, |p| p.current_progress);
                format!("[{}/{}]", current, task.duration_days)
            }
        }
    };
    let mut line = format!(
        "{} {} {} (+{} hearts, {})",
        marker,
        task.id,
        task.title,
        task.points,
        task.kind.as_str()
    );
    if !progress.is_completed(&task.id) && progress.done_on(&task.id, today) {
        line.push_str(" - done today");
    }
    line
}

/// One reward with whether it is owned or affordable.
pub fn reward_line(reward: &Reward, progress: &UserProgress) -> String {
    let state = if progress.owns(&reward.id) {
        "owned".to_string()
    } else if progress.points >= reward.cost {
        "available".to_string()
    } else {
        format!("need {} more", reward.cost - progress.points)
    };
    format!(
        "{} {} ({} hearts, {}) [{}]",
        reward.id,
        reward.title,
        reward.cost,
        reward.kind.as_str(),
        state
    )
}

pub fn tasks_text(catalog: &Catalog, progress: &UserProgress, today: &str) -> String {
    if catalog.tasks.is_empty() {
        return "No quests yet.".to_string();
    }
    catalog
        .tasks
        .iter()
        .map(|t| task_line(t, progress, today))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn rewards_text(catalog: &Catalog, progress: &UserProgress) -> String {
    if catalog.rewards.is_empty() {
        return "No rewards yet.".to_string();
    }
    catalog
        .rewards
        .iter()
        .map(|r| reward_line(r, progress))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary header plus quests and rewards.
pub fn status_text(catalog: &Catalog, progress: &UserProgress, today: &str, offline: bool) -> String {
    let mut out = format!("{}: {} hearts", progress.name, progress.points);
    if offline {
        out.push_str(" (offline, changes saved on this device)");
    }
    out.push_str("\n\nQuests\n");
    out.push_str(&tasks_text(catalog, progress, today));
    out.push_str("\n\nRewards\n");
    out.push_str(&rewards_text(catalog, progress));
    out
}

/// The JSON form of [`status_text`].
pub fn status_json(catalog: &Catalog, progress: &UserProgress, offline: bool) -> Value {
    json!({
        "user": progress,
        "offline": offline,
        "tasks": catalog.tasks,
        "rewards": catalog.rewards,
    })
}

fn save_note(saved: Option<SaveStatus>) -> &'static str {
    match saved {
        Some(SaveStatus::LocalOnly) => " (saved on this device only)",
        Some(SaveStatus::Unsaved) => " (could not be saved)",
        _ => "",
    }
}

pub fn completion_text(task: &str, outcome: &CompletionOutcome, saved: Option<SaveStatus>) -> String {
    let msg = match outcome {
        CompletionOutcome::Recorded { current, target } => {
            format!("Nice! {} is at {}/{} days.", task, current, target)
        }
        CompletionOutcome::Completed { points } => {
            format!("Quest complete! You earned {} hearts.", points)
        }
        CompletionOutcome::AlreadyDoneToday => {
            format!("{} is already done for today. Come back tomorrow!", task)
        }
        CompletionOutcome::AlreadyCompleted => format!("{} is already complete.", task),
    };
    format!("{}{}", msg, save_note(saved))
}

pub fn purchase_text(reward: &str, outcome: &PurchaseOutcome, saved: Option<SaveStatus>) -> String {
    let msg = match outcome {
        PurchaseOutcome::Purchased { cost, remaining } => format!(
            "Unlocked {} for {} hearts. {} hearts left.",
            reward, cost, remaining
        ),
        PurchaseOutcome::InsufficientPoints { needed, available } => format!(
            "Not enough hearts for {}: it costs {}, you have {}.",
            reward, needed, available
        ),
        PurchaseOutcome::AlreadyOwned => format!("You already own {}.", reward),
    };
    format!("{}{}", msg, save_note(saved))
}
