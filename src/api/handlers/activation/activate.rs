//! Activation endpoint: applies credentials and flips a pending user to
//! active exactly once.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::errors::ActivationError;
use super::signup::validate_password_pair;
use super::state::ActivationConfig;
use super::storage::{activate_user, ActivateOutcome, CredentialUpdate};
use super::types::{ActivateRequest, ActivateResponse};
use super::utils::hash_perishable_token;

#[utoipa::path(
    post,
    path = "/activate/{user_id}",
    request_body = ActivateRequest,
    params(
        ("user_id" = Uuid, Path, description = "Id of the user being activated")
    ),
    responses(
        (status = 200, description = "Account activated, confirmation email queued", body = ActivateResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 404, description = "Unknown user or invalid/expired token", body = String),
        (status = 409, description = "Account is already activated", body = String),
        (status = 422, description = "Credential validation failed", body = String)
    ),
    tag = "activation"
)]
pub async fn activate(
    pool: Extension<PgPool>,
    config: Extension<Arc<ActivationConfig>>,
    Path(user_id): Path<Uuid>,
    payload: Option<Json<ActivateRequest>>,
) -> impl IntoResponse {
    let request: ActivateRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let token = request.token.trim();
    if token.is_empty() {
        return ActivationError::NotFound.into_response();
    }

    let mut errors = Vec::new();
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

    let openid_identifier = request
        .openid_identifier
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let credential = CredentialUpdate {
        password_hash,
        openid_identifier,
    };

    let token_hash = hash_perishable_token(token);
    match activate_user(&pool, user_id, &token_hash, &credential, &config).await {
        Ok(ActivateOutcome::Activated) => (
            StatusCode::OK,
            Json(ActivateResponse {
                notice: "Your account has been activated!".to_string(),
            }),
        )
            .into_response(),
        Ok(ActivateOutcome::NotFound) => ActivationError::NotFound.into_response(),
        Ok(ActivateOutcome::AlreadyActivated) => {
            ActivationError::AlreadyActivated.into_response()
        }
        Ok(ActivateOutcome::MissingCredentials) => {
            ActivationError::validation("password", "can't be blank").into_response()
        }
        Err(err) => {
            error!("Failed to activate user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Activation failed".to_string(),
            )
                .into_response()
        }
    }
}
