use axum::response::IntoResponse;

/// Service banner for `/`, intentionally undocumented in the OpenAPI spec.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};

    #[tokio::test]
    async fn root_returns_name_and_version() -> anyhow::Result<()> {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024).await?;
        let body = String::from_utf8(bytes.to_vec())?;
        assert!(body.contains(env!("CARGO_PKG_NAME")));
        assert!(body.contains(env!("CARGO_PKG_VERSION")));
        Ok(())
    }
}
