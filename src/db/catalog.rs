//! Task and reward catalog operations.
//!
//! Catalog entries are append-only: there is no update or delete.

use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{NewReward, NewTask, Reward, RewardKind, Task, TaskKind};
use crate::validate;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let kind: String = row.get("kind")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        kind: TaskKind::parse(&kind).unwrap_or(TaskKind::Once),
        duration_days: row.get("duration")?,
        points: row.get("points")?,
    })
}

fn parse_reward_row(row: &Row) -> rusqlite::Result<Reward> {
    let kind: String = row.get("kind")?;
    Ok(Reward {
        id: row.get("id")?,
        title: row.get("title")?,
        kind: RewardKind::parse(&kind).unwrap_or(RewardKind::Text),
        content: row.get("content")?,
        cost: row.get("cost")?,
    })
}

fn id_exists(conn: &Connection, table: &'static str, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    let found: Option<i64> = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Time-based id (`t1760000000000`) with a counter suffix on collision.
fn fresh_id(conn: &Connection, table: &'static str, prefix: char) -> Result<String> {
    let base = format!("{}{}", prefix, now_ms());
    if !id_exists(conn, table, &base)? {
        return Ok(base);
    }
    for n in 1..1000 {
        let candidate = format!("{}-{}", base, n);
        if !id_exists(conn, table, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(anyhow!("could not allocate a fresh {} id", table))
}

impl Database {
    /// All tasks in insertion order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY created_at, rowid")?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Create a task. Generates an id when the input has none.
    pub fn create_task(&self, input: &NewTask) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut task = validate::task(input, String::new)?;
            if task.id.is_empty() {
                task.id = fresh_id(&tx, "tasks", 't')?;
            } else if id_exists(&tx, "tasks", &task.id)? {
                return Err(ApiError::already_exists("Task", &task.id).into());
            }

            tx.execute(
                "INSERT INTO tasks (id, title, description, kind, duration, points, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.kind.as_str(),
                    task.duration_days,
                    task.points,
                    now_ms()
                ],
            )?;
            tx.commit()?;
            Ok(task)
        })
    }

    /// All rewards in insertion order.
    pub fn list_rewards(&self) -> Result<Vec<Reward>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM rewards ORDER BY created_at, rowid")?;
            let rewards = stmt
                .query_map([], parse_reward_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rewards)
        })
    }

    /// Create a reward. Generates an id when the input has none.
    pub fn create_reward(&self, input: &NewReward) -> Result<Reward> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut reward = validate::reward(input, String::new)?;
            if reward.id.is_empty() {
                reward.id = fresh_id(&tx, "rewards", 'r')?;
            } else if id_exists(&tx, "rewards", &reward.id)? {
                return Err(ApiError::already_exists("Reward", &reward.id).into());
            }

            tx.execute(
                "INSERT INTO rewards (id, title, kind, content, cost, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    reward.id,
                    reward.title,
                    reward.kind.as_str(),
                    reward.content,
                    reward.cost,
                    now_ms()
                ],
            )?;
            tx.commit()?;
            Ok(reward)
        })
    }
}
