//! User progress documents.

use super::{Database, now_ms};
use crate::types::UserProgress;
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use serde::de::DeserializeOwned;

/// Decode a JSON column. A corrupt value fails the whole read.
fn json_column<T: DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

fn parse_user_row(row: &Row) -> rusqlite::Result<UserProgress> {
    Ok(UserProgress {
        name: row.get("name")?,
        points: row.get("points")?,
        completed_tasks: json_column(row, "completed_tasks")?,
        unlocked_rewards: json_column(row, "unlocked_rewards")?,
        daily_progress: json_column(row, "daily_progress")?,
    })
}

impl Database {
    /// Progress for `name`, or None if the name was never saved.
    pub fn get_user(&self, name: &str) -> Result<Option<UserProgress>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE name = ?1",
                    params![name],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Insert or replace the whole progress document for `progress.name`.
    ///
    /// Concurrent writers race; the last write wins in full.
    pub fn upsert_user(&self, progress: &UserProgress) -> Result<UserProgress> {
        let completed = serde_json::to_string(&progress.completed_tasks)?;
        let unlocked = serde_json::to_string(&progress.unlocked_rewards)?;
        let daily = serde_json::to_string(&progress.daily_progress)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, points, completed_tasks, unlocked_rewards, daily_progress, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(name) DO UPDATE SET
                    points = excluded.points,
                    completed_tasks = excluded.completed_tasks,
                    unlocked_rewards = excluded.unlocked_rewards,
                    daily_progress = excluded.daily_progress,
                    updated_at = excluded.updated_at",
                params![
                    progress.name,
                    progress.points,
                    completed,
                    unlocked,
                    daily,
                    now_ms()
                ],
            )?;
            Ok(())
        })?;

        Ok(progress.clone())
    }
}
