//! Input validation shared by the API server and the admin catalog path.
//!
//! Nothing is created when validation fails.

use crate::error::{ApiError, ApiResult};
use crate::types::{NewReward, NewTask, Reward, Task, TaskKind};

/// Trimmed user name, or an error if it is blank.
pub fn user_name(name: Option<&str>) -> ApiResult<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(ApiError::missing_field("name")),
    }
}

fn required(field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(value.to_string())
}

fn explicit_id(id: Option<&str>) -> ApiResult<Option<String>> {
    match id.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) if id.len() > 64 => Err(ApiError::invalid_value(
            "id",
            "id must be at most 64 characters",
        )),
        Some(id) => Ok(Some(id.to_string())),
    }
}

/// Validate a new task and build it with `id` (or its own id when given).
pub fn task(input: &NewTask, generated_id: impl FnOnce() -> String) -> ApiResult<Task> {
    let title = required("title", &input.title)?;
    let description = required("description", &input.description)?;
    let duration_days = match input.kind {
        TaskKind::Daily if input.duration_days == 0 => {
            return Err(ApiError::invalid_value(
                "duration",
                "duration must be at least 1 day",
            ));
        }
        TaskKind::Daily => input.duration_days,
        // a one-time task is a single-day streak
        TaskKind::Once => input.duration_days.max(1),
    };
    let id = explicit_id(input.id.as_deref())?.unwrap_or_else(generated_id);

    Ok(Task {
        id,
        title,
        description,
        kind: input.kind,
        duration_days,
        points: input.points,
    })
}

/// Validate a new reward and build it with `id` (or its own id when given).
pub fn reward(input: &NewReward, generated_id: impl FnOnce() -> String) -> ApiResult<Reward> {
    let title = required("title", &input.title)?;
    let content = required("content", &input.content)?;
    let id = explicit_id(input.id.as_deref())?.unwrap_or_else(generated_id);

    Ok(Reward {
        id,
        title,
        kind: input.kind,
        content,
        cost: input.cost,
    })
}
