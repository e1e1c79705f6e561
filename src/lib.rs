//! # Aktivigo (Signup & Account Activation)
//!
//! `aktivigo` handles user signup and email-driven account activation.
//!
//! ## Activation Lifecycle
//!
//! A user is either **pending** (`active = false`) or **activated**
//! (`active = true`); the transition is one-way and happens exactly once.
//!
//! - **Signup** creates a pending user, issues a perishable token, and
//!   enqueues an "activation instructions" email whose link embeds the token.
//! - **Activation form** resolves a token (valid for a fixed window, 7 days
//!   by default) to the pending user so a credential form can be rendered.
//! - **Activate** applies the credential input (password pair or OpenID
//!   identifier), flips `active` with a compare-and-set so two racing
//!   requests produce exactly one success, rotates the token, and enqueues
//!   an "activation confirmation" email.
//!
//! ## Perishable Tokens
//!
//! Raw tokens only ever appear in email links; the database stores a SHA-256
//! hash. Rotation and email enqueue share one transaction, so the link sent
//! always matches the token stored at send time.
//!
//! ## Email Delivery
//!
//! Outbound email goes through a transactional outbox table polled by a
//! background worker. Delivery failures are retried with backoff and never
//! roll back an activation.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
