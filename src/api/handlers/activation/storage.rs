//! Database helpers for the activation lifecycle.
//!
//! Every state transition that also sends mail (signup, activation) rotates
//! the perishable token and enqueues the outbox row in the same transaction,
//! so the link embedded in the email always matches the token stored at send
//! time.

use anyhow::{Context, Result};
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::state::ActivationConfig;
use super::utils::{
    build_activation_url, generate_perishable_token, hash_perishable_token, is_unique_violation,
    unique_violation_field,
};

pub(super) const TEMPLATE_ACTIVATION_INSTRUCTIONS: &str = "activation_instructions";
pub(super) const TEMPLATE_ACTIVATION_CONFIRMATION: &str = "activation_confirmation";

/// Outcome when creating a new pending user.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created { user_id: Uuid },
    Conflict { field: &'static str },
}

/// Outcome of an activation attempt.
#[derive(Debug)]
pub(super) enum ActivateOutcome {
    Activated,
    NotFound,
    AlreadyActivated,
    /// The user would end up activated without any credential set.
    MissingCredentials,
}

/// Pending user resolved from a perishable token, enough to render the
/// credential-entry form.
pub(super) struct PendingUser {
    pub(super) id: Uuid,
    pub(super) login: String,
    pub(super) email: String,
}

/// Credential fields applied at activation time. `None` leaves any value set
/// at signup untouched.
#[derive(Debug, Default)]
pub(super) struct CredentialUpdate {
    pub(super) password_hash: Option<String>,
    pub(super) openid_identifier: Option<String>,
}

impl CredentialUpdate {
    pub(super) fn is_empty(&self) -> bool {
        self.password_hash.is_none() && self.openid_identifier.is_none()
    }
}

/// Create a pending user, issue its first perishable token, and enqueue the
/// activation instructions email, all in one transaction.
pub(super) async fn insert_pending_user(
    pool: &PgPool,
    login: &str,
    email: &str,
    password_hash: Option<&str>,
    config: &ActivationConfig,
) -> Result<SignupOutcome> {
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO users
            (login, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(login)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let field = unique_violation_field(&err).unwrap_or("login");
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict { field });
            }
            return Err(err).context("failed to insert user");
        }
    };

    let token = rotate_perishable_token(&mut tx, user_id).await?;
    let activation_url = build_activation_url(config.base_url(), &token);
    enqueue_email(
        &mut tx,
        email,
        TEMPLATE_ACTIVATION_INSTRUCTIONS,
        &json!({
            "login": login,
            "activation_url": activation_url,
        }),
    )
    .await?;

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created { user_id })
}

/// Resolve a token hash to its pending user, honoring the validity window.
/// Expired tokens and active users both come back as `None`; no mutation.
pub(super) async fn find_pending_by_token(
    pool: &PgPool,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<Option<PendingUser>> {
    let query = r"
        SELECT id, login, email
        FROM users
        WHERE perishable_token_hash = $1
          AND token_issued_at > NOW() - ($2 * INTERVAL '1 second')
          AND active = false
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by token")?;

    Ok(row.map(|row| PendingUser {
        id: row.get("id"),
        login: row.get("login"),
        email: row.get("email"),
    }))
}

/// Activate a user: re-validate the token, apply credentials, and flip
/// `active` exactly once.
///
/// The row is locked with `FOR UPDATE` and the flip is a compare-and-set on
/// `active = false`, so two racing requests produce exactly one success.
pub(super) async fn activate_user(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &[u8],
    credential: &CredentialUpdate,
    config: &ActivationConfig,
) -> Result<ActivateOutcome> {
    let mut tx = pool.begin().await.context("begin activate transaction")?;

    let query = r"
        SELECT login,
               email,
               active,
               perishable_token_hash,
               (token_issued_at IS NOT NULL
                AND token_issued_at > NOW() - ($2 * INTERVAL '1 second')) AS token_fresh,
               (password_hash IS NOT NULL
                OR openid_identifier IS NOT NULL) AS has_credentials
        FROM users
        WHERE id = $1
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(config.token_ttl_seconds())
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to load user for activation")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(ActivateOutcome::NotFound);
    };

    if row.get::<bool, _>("active") {
        let _ = tx.rollback().await;
        return Ok(ActivateOutcome::AlreadyActivated);
    }

    let stored_hash: Option<Vec<u8>> = row.get("perishable_token_hash");
    let token_fresh: bool = row.get("token_fresh");
    if !token_fresh || stored_hash.as_deref() != Some(token_hash) {
        let _ = tx.rollback().await;
        return Ok(ActivateOutcome::NotFound);
    }

    let has_credentials: bool = row.get("has_credentials");
    if credential.is_empty() && !has_credentials {
        let _ = tx.rollback().await;
        return Ok(ActivateOutcome::MissingCredentials);
    }

    let login: String = row.get("login");
    let email: String = row.get("email");

    let query = r"
        UPDATE users
        SET active = true,
            password_hash = COALESCE($2, password_hash),
            openid_identifier = COALESCE($3, openid_identifier),
            updated_at = NOW()
        WHERE id = $1
          AND active = false
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let updated = sqlx::query(query)
        .bind(user_id)
        .bind(credential.password_hash.as_deref())
        .bind(credential.openid_identifier.as_deref())
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to activate user")?;

    if updated.is_none() {
        // Lost the check-and-set despite the row lock; treat as already done.
        let _ = tx.rollback().await;
        return Ok(ActivateOutcome::AlreadyActivated);
    }

    let _token = rotate_perishable_token(&mut tx, user_id).await?;
    let root_url = format!("{}/", config.base_url().trim_end_matches('/'));
    enqueue_email(
        &mut tx,
        &email,
        TEMPLATE_ACTIVATION_CONFIRMATION,
        &json!({
            "login": login,
            "root_url": root_url,
        }),
    )
    .await?;

    tx.commit().await.context("commit activate transaction")?;

    Ok(ActivateOutcome::Activated)
}

/// Issue a fresh perishable token for the user and return the raw value.
/// The hash column stays unique; a collision of 32 random bytes would fail
/// the transaction like any other database error.
pub(super) async fn rotate_perishable_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
) -> Result<String> {
    let query = r"
        UPDATE users
        SET perishable_token_hash = $2,
            token_issued_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );

    let token = generate_perishable_token()?;
    let token_hash = hash_perishable_token(&token);
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to rotate perishable token")?;

    Ok(token)
}

async fn enqueue_email(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    to_email: &str,
    template: &str,
    payload: &serde_json::Value,
) -> Result<()> {
    let payload_text = serde_json::to_string(payload).context("failed to serialize email payload")?;

    let query = r"
        INSERT INTO email_outbox (to_email, template, payload_json)
        VALUES ($1, $2, $3::jsonb)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(to_email)
        .bind(template)
        .bind(payload_text)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert email outbox row")?;

    Ok(())
}
