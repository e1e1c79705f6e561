//! Helpers for input normalization and perishable token handling.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng as SaltRng, PasswordHasher, SaltString},
    Argon2,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Normalize an email or login for lookup/uniqueness checks.
pub(super) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Logins are short lowercase identifiers, first character alphanumeric.
pub(super) fn valid_login(login_normalized: &str) -> bool {
    Regex::new(r"^[a-z0-9][a-z0-9_.-]{2,31}$")
        .is_ok_and(|regex| regex.is_match(login_normalized))
}

/// Create a new perishable activation token.
///
/// The raw token only appears in the email link; the database stores a hash.
pub(super) fn generate_perishable_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate perishable token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a perishable token so the raw value never touches the database.
pub(super) fn hash_perishable_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Hash a password for storage (argon2 PHC string).
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut SaltRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Build the registration link included in activation instruction emails.
pub(super) fn build_activation_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/register/{token}")
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Name the user field behind a unique violation so signup can report it.
pub(super) fn unique_violation_field(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let constraint = db_err.constraint()?;
    if constraint.contains("login") {
        Some("login")
    } else if constraint.contains("email") {
        Some("email")
    } else {
        None
    }
}
