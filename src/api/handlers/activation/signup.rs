//! Signup endpoint: creates a pending user and sends activation instructions.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::errors::{ActivationError, FieldError};
use super::state::{ActivationConfig, PASSWORD_MIN_LENGTH};
use super::storage::{insert_pending_user, SignupOutcome};
use super::types::{SignupRequest, SignupResponse};
use super::utils::{hash_password, normalize, valid_email, valid_login};

#[utoipa::path(
    post,
    path = "/users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created, activation instructions queued", body = SignupResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 422, description = "Validation failed", body = String)
    ),
    tag = "activation"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    config: Extension<Arc<ActivationConfig>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let request: SignupRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let login = normalize(&request.login);
    let email = normalize(&request.email);

    let mut errors = Vec::new();
    if !valid_login(&login) {
        errors.push(FieldError::new("login", "is invalid"));
    }
    if !valid_email(&email) {
        errors.push(FieldError::new("email", "is invalid"));
    }

    // A password is optional at signup; when supplied, the pair is validated
    // now instead of waiting for activation.
    let password_hash = match validate_password_pair(
        request.password.as_deref(),
        request.password_confirmation.as_deref(),
        &mut errors,
    ) {
        Ok(hash) => hash,
        Err(response) => return response,
    };

    if !errors.is_empty() {
        return ActivationError::ValidationFailed(errors).into_response();
    }

    match insert_pending_user(&pool, &login, &email, password_hash.as_deref(), &config).await {
        Ok(SignupOutcome::Created { user_id }) => (
            StatusCode::CREATED,
            Json(SignupResponse {
                id: user_id.to_string(),
                notice: "Your account has been created. Please check your e-mail for your \
                         account activation instructions!"
                    .to_string(),
            }),
        )
            .into_response(),
        Ok(SignupOutcome::Conflict { field }) => {
            ActivationError::validation(field, "has already been taken").into_response()
        }
        Err(err) => {
            error!("Failed to create user: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Signup failed".to_string()).into_response()
        }
    }
}

/// Validate an optional password/confirmation pair and hash the password.
/// Field errors accumulate in `errors`; hashing failures short-circuit with a
/// 500 response.
pub(super) fn validate_password_pair(
    password: Option<&str>,
    confirmation: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Result<Option<String>, axum::response::Response> {
    let Some(password) = password else {
        if confirmation.is_some() {
            errors.push(FieldError::new("password", "can't be blank"));
        }
        return Ok(None);
    };

    if password.len() < PASSWORD_MIN_LENGTH {
        errors.push(FieldError::new("password", "is too short"));
        return Ok(None);
    }
    if confirmation != Some(password) {
        errors.push(FieldError::new(
            "password_confirmation",
            "doesn't match password",
        ));
        return Ok(None);
    }

    match hash_password(password) {
        Ok(hash) => Ok(Some(hash)),
        Err(err) => {
            error!("Failed to hash password: {err}");
            Err(
                (StatusCode::INTERNAL_SERVER_ERROR, "Signup failed".to_string())
                    .into_response(),
            )
        }
    }
}
