//! # Caller Routes
//!
//! Routes:
//! - GET /api/auth/me: the verified user id of the caller

use axum::routing::get;
use axum::{Json, Router};
use lia_core::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::state::AppState;

/// Payload of `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeData {
    #[schema(value_type = String, example = "u1")]
    pub user_id: UserId,
}

/// Success envelope for `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub success: bool,
    pub data: MeData,
}

/// Routes that require an authenticated caller. The caller mounts the gate.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me))
}

/// Return the identity the gate resolved for this request.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated caller", body = MeResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = crate::error::ErrorBody),
        (status = 500, description = "Identity lookup failed", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        data: MeData {
            user_id: user.user_id,
        },
    })
}
