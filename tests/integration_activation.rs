//! Integration tests for the activation lifecycle against a real database.
//!
//! This suite verifies the invariants that only hold at the database level:
//! 1. Signup persists a pending user and enqueues exactly one instructions
//!    email whose link carries the freshly rotated token.
//! 2. The activation form resolves that token to the pending user.
//! 3. Two racing activations produce exactly one success; the loser gets the
//!    already-activated conflict and nothing is double-applied.
//! 4. Activation rotates the token (the old link dies) and enqueues exactly
//!    one confirmation email; the transition is one-way.
//!
//! The suite needs PostgreSQL and runs only when `AKTIVIGO_TEST_DSN` is set,
//! for example:
//!
//! ```sh
//! AKTIVIGO_TEST_DSN=postgres://postgres@localhost:5432/aktivigo_test cargo test
//! ```

use aktivigo::api::{self, handlers::activation::ActivationConfig};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::{env, sync::Arc};
use tower::ServiceExt;
use uuid::Uuid;

async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = env::var("AKTIVIGO_TEST_DSN") else {
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .context("Failed to connect to test database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    Ok(Some(pool))
}

fn app(pool: PgPool) -> Result<Router> {
    Ok(api::app(pool, Arc::new(ActivationConfig::default()))?)
}

fn json_request(method: &str, uri: &str, body: Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Unique login per run so reruns never trip the uniqueness constraints.
fn fresh_login() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("it{}", &suffix[..12])
}

async fn outbox_payloads(pool: &PgPool, to_email: &str, template: &str) -> Result<Vec<Value>> {
    let rows = sqlx::query(
        r"
        SELECT payload_json::text AS payload_json
        FROM email_outbox
        WHERE to_email = $1 AND template = $2
        ORDER BY created_at
        ",
    )
    .bind(to_email)
    .bind(template)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let payload: String = row.get("payload_json");
            serde_json::from_str(&payload).context("outbox payload is not JSON")
        })
        .collect()
}

fn token_from_activation_url(payload: &Value) -> Result<String> {
    let url = payload["activation_url"]
        .as_str()
        .context("payload missing activation_url")?;
    let (_, token) = url
        .rsplit_once("/register/")
        .context("activation_url missing /register/ segment")?;
    Ok(token.to_string())
}

#[tokio::test]
async fn signup_and_racing_activations() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let app = app(pool.clone())?;

    let login = fresh_login();
    let email = format!("{login}@example.com");

    // Signup: pending user plus exactly one instructions email.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "login": login, "email": email }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = json_body(response).await?["id"]
        .as_str()
        .context("signup response missing id")?
        .to_string();

    let instructions = outbox_payloads(&pool, &email, "activation_instructions").await?;
    assert_eq!(instructions.len(), 1);
    let token = token_from_activation_url(&instructions[0])?;
    assert!(!token.is_empty());

    let active: bool = sqlx::query("SELECT active FROM users WHERE login = $1")
        .bind(&login)
        .fetch_one(&pool)
        .await?
        .get("active");
    assert!(!active);

    // The emailed token resolves to the pending user.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/register/{token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let form = json_body(response).await?;
    assert_eq!(form["id"].as_str(), Some(user_id.as_str()));
    assert_eq!(form["login"].as_str(), Some(login.as_str()));

    // Two racing activations: exactly one success, one conflict.
    let activate_body = json!({
        "token": token,
        "password": "pw123",
        "password_confirmation": "pw123",
    });
    let uri = format!("/activate/{user_id}");
    let (first, second) = tokio::join!(
        app.clone()
            .oneshot(json_request("POST", &uri, activate_body.clone())?),
        app.clone()
            .oneshot(json_request("POST", &uri, activate_body.clone())?),
    );
    let mut statuses = vec![first?.status(), second?.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let active: bool = sqlx::query("SELECT active FROM users WHERE login = $1")
        .bind(&login)
        .fetch_one(&pool)
        .await?
        .get("active");
    assert!(active);

    // One confirmation enqueue despite the race.
    let confirmations = outbox_payloads(&pool, &email, "activation_confirmation").await?;
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0]["login"].as_str(), Some(login.as_str()));

    // Activation rotated the token, so the emailed link is dead.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/register/{token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The transition is one-way: re-activating conflicts and changes nothing.
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, activate_body)?)
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let instructions = outbox_payloads(&pool, &email, "activation_instructions").await?;
    assert_eq!(instructions.len(), 1);

    Ok(())
}

#[tokio::test]
async fn signup_conflict_reports_duplicated_field() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let app = app(pool.clone())?;

    let login = fresh_login();
    let email = format!("{login}@example.com");
    let body = json!({ "login": login, "email": email });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/users", body.clone())?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/users", body)?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = json_body(response).await?;
    let field = errors["errors"][0]["field"].as_str();
    assert!(field == Some("login") || field == Some("email"));

    // The failed signup enqueued nothing.
    let instructions = outbox_payloads(&pool, &email, "activation_instructions").await?;
    assert_eq!(instructions.len(), 1);

    Ok(())
}
