//! # Middleware Modules
//!
//! Cross-cutting layers for the API service. The auth gate itself lives in
//! [`crate::auth`].

pub mod metrics;
pub mod trace;
