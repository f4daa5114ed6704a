//! Magic codes: progress snapshots as copy-pasteable text.
//!
//! A code is the JSON progress document encoded with standard base64, the
//! same bytes the web client produced with `btoa(JSON.stringify(progress))`.
//! There is no signature; only the structure is checked.

use crate::types::UserProgress;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use thiserror::Error;

/// Why a magic code was rejected.
#[derive(Debug, Error)]
pub enum InvalidCodeError {
    #[error("magic code is empty")]
    Empty,
    #[error("a name is required to load a magic code")]
    MissingTargetName,
    #[error("magic code is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("magic code does not contain text")]
    NotText,
    #[error("magic code does not contain a progress record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("magic code is missing the `{0}` field")]
    MissingField(&'static str),
}

/// Encode a progress record as a magic code.
pub fn encode(progress: &UserProgress) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(progress)?;
    Ok(STANDARD.encode(json))
}

/// Decode a magic code and rebind it to `target_name`.
///
/// The imported record belongs to whoever loads it, whatever name it was
/// exported under.
pub fn decode(code: &str, target_name: &str) -> Result<UserProgress, InvalidCodeError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(InvalidCodeError::Empty);
    }
    let target_name = target_name.trim();
    if target_name.is_empty() {
        return Err(InvalidCodeError::MissingTargetName);
    }

    // Copying out of chat apps tends to wrap long codes.
    let compact: String = code.split_whitespace().collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    let text = String::from_utf8(bytes).map_err(|_| InvalidCodeError::NotText)?;
    let value: Value = serde_json::from_str(&text)?;

    let has_name = value
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    if !has_name {
        return Err(InvalidCodeError::MissingField("name"));
    }
    if value.get("completedTasks").is_none_or(Value::is_null) {
        return Err(InvalidCodeError::MissingField("completedTasks"));
    }

    let mut progress: UserProgress = serde_json::from_value(value)?;
    progress.name = target_name.to_string();
    Ok(progress)
}
