//! Secret handling utilities.
//!
//! Re-exports the secrecy types used for the store password.

pub use secrecy::{ExposeSecret, SecretString};
