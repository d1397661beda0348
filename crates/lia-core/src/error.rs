//! # Error Types
//!
//! All errors use `thiserror`. Messages never include token material or
//! secrets; they are safe to log.

use thiserror::Error;

/// A domain value failed validation on construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// User identifiers must contain at least one non-whitespace character.
    #[error("user id must not be empty")]
    EmptyUserId,
}

/// Failure to issue or verify a bearer token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature mismatch, bad encoding, wrong algorithm, or missing claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signature and structure are fine but `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The signing secret was empty.
    #[error("signing secret must not be empty")]
    EmptySecret,

    /// Signing failed while issuing a token.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}
