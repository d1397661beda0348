//! # API Route Modules
//!
//! - `health`: liveness/readiness probes and `/metrics` (unauthenticated).
//! - `auth`: routes behind the auth gate that describe the caller.
//!
//! Task, appointment, finance, and notification routes mount behind the
//! same gate and take [`crate::auth::AuthenticatedUser`] as an argument.

pub mod auth;
pub mod health;
