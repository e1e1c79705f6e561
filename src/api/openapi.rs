use super::handlers::{activation, health};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated spec. Routes added outside (like `/` or
/// `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(activation::signup::signup))
        .routes(routes!(activation::form::activation_form))
        .routes(routes!(activation::activate::activate))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.license = cargo_license();

    let mut activation_tag = Tag::new("activation");
    activation_tag.description = Some("Signup and account activation".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service health".to_string());

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![activation_tag, health_tag]))
        .build()
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
