//! # lia-core: Foundational Types for LIA Admin
//!
//! The leaf of the workspace DAG. Defines the identity primitives the auth
//! gate reasons about and the token codec that issues and verifies bearer
//! credentials.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** A `UserId` is never a bare `String`; it is
//!    validated on construction and cannot be empty.
//!
//! 2. **Stateless credentials.** A token carries its subject and expiry and
//!    is verified with the shared secret alone. Whether the subject is still
//!    allowed to authenticate is a question for the identity store, not for
//!    this crate.
//!
//! 3. **Two verification outcomes that matter.** `TokenError::Expired` and
//!    `TokenError::Invalid` are kept apart so callers can tell "re-login"
//!    from "this credential was never good".
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lia-*` crates.
//! - No HTTP or database types.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod token;

pub use error::{TokenError, ValidationError};
pub use identity::{UserId, UserStatus};
pub use token::{IssuedToken, TokenClaims, TokenCodec};
