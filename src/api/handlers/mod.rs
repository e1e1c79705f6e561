//! API handlers for Aktivigo.
//!
//! The activation module owns the signup/activation lifecycle; `health` and
//! `root` cover service plumbing.

pub mod activation;
pub mod health;
pub mod root;
