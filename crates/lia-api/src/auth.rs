//! # Auth Gate
//!
//! Bearer-token middleware that runs before every protected handler.
//!
//! ## Pipeline
//!
//! ```text
//! Authorization header ─► "Bearer <token>" ─► signature + expiry ─► identity store ─► handler
//!        │                      │                    │                    │
//!   MISSING_TOKEN          MISSING_TOKEN     INVALID_TOKEN /        TOKEN_NO_LONGER_VALID
//!                                            TOKEN_EXPIRED          IDENTITY_LOOKUP_FAILED (500)
//! ```
//!
//! On success the gate inserts exactly one value into request extensions,
//! an [`AuthenticatedUser`], and forwards the request. On failure it answers
//! directly and the handler never runs.
//!
//! The gate never writes to the store, never re-issues or extends a token,
//! and never logs token contents.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use lia_core::{TokenCodec, TokenError, UserId};
use thiserror::Error;

use crate::error::ErrorBody;
use crate::middleware::metrics;
use crate::store::{IdentityStore, StoreError};

const BEARER_PREFIX: &str = "Bearer ";

// ── AuthError ───────────────────────────────────────────────────────────────

/// Why a request was turned away at the gate.
///
/// Each variant maps to its own stable code because each asks the caller
/// for a different corrective action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or not of the form `Bearer <token>`.
    #[error("Access token required")]
    MissingToken,

    /// Bad signature, malformed token, or unusable claims.
    #[error("Invalid token")]
    InvalidToken,

    /// Well-formed and correctly signed, but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// The subject does not exist or has been deactivated.
    #[error("Token no longer valid")]
    NoLongerValid,

    /// The identity store could not answer.
    #[error("identity lookup failed: {0}")]
    LookupFailed(#[from] StoreError),
}

impl AuthError {
    /// Machine-readable code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NoLongerValid => "TOKEN_NO_LONGER_VALID",
            Self::LookupFailed(_) => "IDENTITY_LOOKUP_FAILED",
        }
    }

    /// HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::LookupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::LookupFailed(_) => "Authentication service unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::LookupFailed(err) => {
                tracing::error!(error = %err, "authentication aborted: identity lookup failed");
            }
            other => {
                tracing::warn!(code = other.code(), "authentication rejected");
            }
        }

        ErrorBody::new(self.code(), self.public_message()).into_response_with(self.status())
    }
}

// ── AuthenticatedUser ───────────────────────────────────────────────────────

/// The verified caller, placed in request extensions by the gate.
///
/// Handlers behind the gate take this as an argument and may trust it
/// without re-verifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Returns 401 `MISSING_TOKEN` if the gate did not run for this route.
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

// ── Header parsing ──────────────────────────────────────────────────────────

/// Pull the raw token out of an `Authorization` header value.
///
/// The prefix is matched literally: `Bearer` with a capital B and exactly
/// one space. Anything else, including an empty or whitespace-bearing
/// token, is rejected before any signature work.
pub fn extract_bearer(value: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = value.ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::MissingToken)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingToken)?;
    if token.is_empty() || token.contains(|c: char| c.is_ascii_whitespace()) {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

// ── AuthGate ────────────────────────────────────────────────────────────────

/// Token verifier plus identity lookup, injected into the middleware as state.
///
/// Stateless between requests: concurrent calls share only the immutable
/// codec and the store handle.
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    store: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .field("store", &"dyn IdentityStore")
            .finish()
    }
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn IdentityStore>) -> Self {
        Self { codec, store }
    }

    /// The codec used for verification, also used to issue tokens.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Render a verdict for one `Authorization` header value.
    pub async fn authenticate(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.codec.verify(token)?;
        let user_id = claims.subject()?;

        match self.store.fetch_status(&user_id).await? {
            Some(status) if status.is_active => Ok(AuthenticatedUser { user_id }),
            Some(_) | None => Err(AuthError::NoLongerValid),
        }
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Axum middleware enforcing the gate. Mount with
/// `axum::middleware::from_fn_with_state(gate, auth_middleware)`.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();

    match gate.authenticate(authorization.as_ref()).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, "request authenticated");
            metrics::record_accepted();
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => reject(err),
    }
}

/// Count a gate rejection and render it. Extractor and handler failures go
/// through `into_response` directly and are not counted.
fn reject(err: AuthError) -> Response {
    metrics::record_rejected(err.code());
    err.into_response()
}
