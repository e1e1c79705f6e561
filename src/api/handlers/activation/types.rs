//! Request/response types for signup and activation endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SignupRequest {
    pub login: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub id: String,
    pub notice: String,
}

/// User reference returned when an activation token resolves to a pending
/// user, enough to render the credential-entry form.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ActivationFormResponse {
    pub id: String,
    pub login: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ActivateRequest {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openid_identifier: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ActivateResponse {
    pub notice: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn signup_request_round_trips() -> Result<()> {
        let request = SignupRequest {
            login: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: Some("pw123".to_string()),
            password_confirmation: Some("pw123".to_string()),
        };
        let value = serde_json::to_value(&request)?;
        let login = value
            .get("login")
            .and_then(serde_json::Value::as_str)
            .context("missing login")?;
        assert_eq!(login, "alice");
        let decoded: SignupRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn signup_request_password_optional() -> Result<()> {
        let decoded: SignupRequest =
            serde_json::from_str(r#"{"login":"bob","email":"b@x.com"}"#)?;
        assert_eq!(decoded.password, None);
        assert_eq!(decoded.password_confirmation, None);
        Ok(())
    }

    #[test]
    fn activate_request_round_trips() -> Result<()> {
        let request = ActivateRequest {
            token: "tok".to_string(),
            openid_identifier: Some("https://id.example.com/alice".to_string()),
            ..ActivateRequest::default()
        };
        let value = serde_json::to_value(&request)?;
        let decoded: ActivateRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.token, "tok");
        assert_eq!(
            decoded.openid_identifier.as_deref(),
            Some("https://id.example.com/alice")
        );
        Ok(())
    }
}
