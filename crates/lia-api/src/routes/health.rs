//! # Health Probes
//!
//! Mounted outside the auth gate so orchestrators can reach them without
//! credentials.
//!
//! Routes:
//! - GET /health/liveness: 200 while the process runs
//! - GET /health/readiness: 200 once the identity store is reachable
//! - GET /metrics: Prometheus exposition

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::middleware::metrics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics::render))
}

/// Liveness probe: always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/liveness",
    responses((status = 200, description = "Process is alive", body = String)),
    tag = "health"
)]
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 until the identity store can answer lookups.
#[utoipa::path(
    get,
    path = "/health/readiness",
    responses(
        (status = 200, description = "Ready to serve", body = String),
        (status = 503, description = "Database not connected", body = crate::error::ErrorBody),
    ),
    tag = "health"
)]
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if state.health.is_ready() {
        Ok("ready")
    } else {
        let snapshot = state.health.snapshot();
        tracing::warn!(
            attempts = snapshot.attempts,
            failures = snapshot.failures,
            "readiness probe failed: database not connected"
        );
        Err(AppError::ServiceUnavailable("database not connected".into()))
    }
}
