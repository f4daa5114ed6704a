//! Structured error types for API and session responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidCode,

    // Not found errors
    RewardNotFound,
    NoActiveSession,

    // Conflict errors
    AlreadyExists,
    RewardNotOwned,

    // Access
    Unauthorized,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status used when this error crosses the API boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::InvalidCode => StatusCode::BAD_REQUEST,
            ErrorCode::RewardNotFound | ErrorCode::NoActiveSession => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists | ErrorCode::RewardNotOwned => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error carried back to API clients and CLI users.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_code(err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidCode,
            "This doesn't seem to be a valid magic code. Please check if you copied it correctly.",
        )
        .with_details(err.to_string())
    }

    pub fn reward_not_found(reward_id: &str) -> Self {
        Self::new(
            ErrorCode::RewardNotFound,
            format!("Reward not found: {}", reward_id),
        )
    }

    pub fn no_session() -> Self {
        Self::new(
            ErrorCode::NoActiveSession,
            "Nobody is logged in. Run `login <name>` first.",
        )
    }

    pub fn already_exists(kind: &str, id: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} {} already exists", kind, id),
        )
        .with_field("id")
    }

    pub fn not_owned(reward_id: &str) -> Self {
        Self::new(
            ErrorCode::RewardNotOwned,
            format!("Reward {} has not been purchased yet", reward_id),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Wrong password!")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) if err.downcast_ref::<rusqlite::Error>().is_some() => ApiError::database(err),
            Err(err) => ApiError::internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for API and session operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
