//! Activation form lookup: resolves a token from an email link to its
//! pending user.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::errors::ActivationError;
use super::state::ActivationConfig;
use super::storage::find_pending_by_token;
use super::types::ActivationFormResponse;
use super::utils::hash_perishable_token;

#[utoipa::path(
    get,
    path = "/register/{activation_code}",
    params(
        ("activation_code" = String, Path, description = "Perishable activation token from the email link")
    ),
    responses(
        (status = 200, description = "Token resolves to a pending user", body = ActivationFormResponse),
        (status = 404, description = "Unknown, expired, or already-used token", body = String)
    ),
    tag = "activation"
)]
pub async fn activation_form(
    pool: Extension<PgPool>,
    config: Extension<Arc<ActivationConfig>>,
    Path(activation_code): Path<String>,
) -> impl IntoResponse {
    let token = activation_code.trim();
    if token.is_empty() {
        return ActivationError::NotFound.into_response();
    }

    let token_hash = hash_perishable_token(token);
    match find_pending_by_token(&pool, &token_hash, config.token_ttl_seconds()).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ActivationFormResponse {
                id: user.id.to_string(),
                login: user.login,
                email: user.email,
            }),
        )
            .into_response(),
        Ok(None) => ActivationError::NotFound.into_response(),
        Err(err) => {
            error!("Failed to resolve activation token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Activation lookup failed".to_string(),
            )
                .into_response()
        }
    }
}
