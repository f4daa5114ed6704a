//! Task completion rules.

use crate::types::{Task, TaskKind, UserProgress};
use chrono::NaiveDate;
use serde::Serialize;

/// Render a calendar day the way stored progress records it ("Fri Oct 16 2026").
pub fn calendar_day(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// What a completion attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// Today was recorded; the streak target is not reached yet.
    Recorded { current: u32, target: u32 },
    /// The task is now complete and its points were credited.
    Completed { points: u32 },
    /// The task was already marked done today.
    AlreadyDoneToday,
    /// The task was completed earlier and no longer changes.
    AlreadyCompleted,
}

impl CompletionOutcome {
    /// Whether the progress changed.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            CompletionOutcome::Recorded { .. } | CompletionOutcome::Completed { .. }
        )
    }
}

/// Apply one completion of `task` on `today`.
pub fn complete_task(progress: &UserProgress, task: &Task, today: NaiveDate) -> UserProgress {
    complete_task_with_outcome(progress, task, today).0
}

/// Apply one completion of `task` on `today`, reporting what happened.
///
/// A task already in `completed_tasks`, or already marked on `today`, leaves
/// the progress untouched.
pub fn complete_task_with_outcome(
    progress: &UserProgress,
    task: &Task,
    today: NaiveDate,
) -> (UserProgress, CompletionOutcome) {
    if progress.is_completed(&task.id) {
        return (progress.clone(), CompletionOutcome::AlreadyCompleted);
    }

    let day = calendar_day(today);
    if progress.done_on(&task.id, &day) {
        return (progress.clone(), CompletionOutcome::AlreadyDoneToday);
    }

    let mut next = progress.clone();
    let entry = next.daily_progress.entry(task.id.clone()).or_default();
    entry.completed_dates.insert(day);

    let finished = match task.kind {
        TaskKind::Once => true,
        TaskKind::Daily => {
            entry.current_progress = entry.current_progress.saturating_add(1);
            entry.current_progress >= task.duration_days
        }
    };
    let current = entry.current_progress;

    if !finished {
        return (
            next,
            CompletionOutcome::Recorded {
                current,
                target: task.duration_days,
            },
        );
    }

    next.completed_tasks.insert(task.id.clone());
    next.points = next.points.saturating_add(task.points);
    (
        next,
        CompletionOutcome::Completed {
            points: task.points,
        },
    )
}
