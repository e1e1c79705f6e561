//! Activation workflow configuration.

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_BASE_URL: &str = "https://aktivigo.dev";

/// Minimum password length accepted at signup or activation.
pub(super) const PASSWORD_MIN_LENGTH: usize = 4;

#[derive(Clone, Debug)]
pub struct ActivationConfig {
    base_url: String,
    token_ttl_seconds: i64,
}

impl ActivationConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    /// Base URL used for activation links, the confirmation root URL, and
    /// the CORS origin.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validity window of a perishable token, measured from `token_issued_at`.
    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config = ActivationConfig::new("https://accounts.example.com".to_string());
        assert_eq!(config.base_url(), "https://accounts.example.com");
        assert_eq!(config.token_ttl_seconds(), DEFAULT_TOKEN_TTL_SECONDS);

        let config = config.with_token_ttl_seconds(3600);
        assert_eq!(config.token_ttl_seconds(), 3600);
    }

    #[test]
    fn default_is_one_week() {
        let config = ActivationConfig::default();
        assert_eq!(config.token_ttl_seconds(), 604_800);
    }
}
