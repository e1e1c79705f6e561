//! Named error kinds for the activation workflow.
//!
//! Every user-facing failure maps to one of three kinds instead of a single
//! undifferentiated error:
//!
//! - `NotFound`: unknown or expired token, unknown user id.
//! - `AlreadyActivated`: idempotency guard; the user is already active and
//!   no state was touched.
//! - `ValidationFailed`: field-level signup/credential errors.
//!
//! None of these are retryable; they are terminal request errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// A single field-level validation error.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    NotFound,
    AlreadyActivated,
    ValidationFailed(Vec<FieldError>),
}

impl ActivationError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::ValidationFailed(vec![FieldError::new(field, message)])
    }
}

impl IntoResponse for ActivationError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()).into_response(),
            Self::AlreadyActivated => (
                StatusCode::CONFLICT,
                "Account is already activated".to_string(),
            )
                .into_response(),
            Self::ValidationFailed(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
        }
    }
}
