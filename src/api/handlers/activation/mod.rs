//! Activation workflow handlers and supporting modules.
//!
//! The lifecycle has two states, pending and activated, with a single
//! one-way transition. The `storage` module enforces at-most-one successful
//! activation per user with a row lock plus compare-and-set; handlers map
//! outcomes to the named error kinds in `errors`.

pub(crate) mod activate;
mod errors;
pub(crate) mod form;
pub(crate) mod signup;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use state::ActivationConfig;
