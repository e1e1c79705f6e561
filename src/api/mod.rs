use crate::api::handlers::{activation::ActivationConfig, health, root};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, options},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub mod email;
pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use crate::GIT_COMMIT_HASH;
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full application: documented routes plus `/` and the
/// preflight-only `OPTIONS /health`, wrapped in the middleware stack.
///
/// # Errors
/// Returns an error if the configured base URL cannot be turned into a CORS
/// origin.
pub fn app(pool: PgPool, config: Arc<ActivationConfig>) -> Result<Router> {
    let origin = cors_origin(config.base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin));

    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(config))
                .layer(Extension(pool)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    config: ActivationConfig,
    email_config: email::EmailWorkerConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // Background worker polls email_outbox (DB-backed queue) for pending
    // rows, delivers/logs them, and retries failures with backoff.
    email::spawn_outbox_worker(pool.clone(), Arc::new(email::LogEmailSender), email_config);

    let app = app(pool, Arc::new(config))?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_origin(base_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Base URL must include a valid host: {base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origin_strips_path_and_keeps_port() -> Result<()> {
        let origin = cors_origin("https://aktivigo.dev/app/")?;
        assert_eq!(origin, HeaderValue::from_static("https://aktivigo.dev"));

        let origin = cors_origin("http://localhost:3000/x")?;
        assert_eq!(origin, HeaderValue::from_static("http://localhost:3000"));
        Ok(())
    }

    #[test]
    fn cors_origin_rejects_invalid_url() {
        assert!(cors_origin("not a url").is_err());
    }
}
