//! # lia-api: Axum API Services for LIA Admin
//!
//! Hosts the auth gate every protected route sits behind, plus the probes
//! and documentation endpoints that stay open.
//!
//! ## API Surface
//!
//! | Path                  | Module                  | Auth  |
//! |-----------------------|-------------------------|-------|
//! | `/health/liveness`    | [`routes::health`]      | open  |
//! | `/health/readiness`   | [`routes::health`]      | open  |
//! | `/metrics`            | [`middleware::metrics`] | open  |
//! | `/openapi.json`       | [`openapi`]             | open  |
//! | `/api/auth/me`        | [`routes::auth`]        | gated |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthGate (gated routes only) → Handler
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
///
/// The gate is applied with `route_layer`, so it only runs for requests that
/// match a gated route; unknown paths still answer 404.
pub fn app(state: AppState) -> Router {
    let gated = routes::auth::router()
        .route_layer(from_fn_with_state(state.gate.clone(), auth::auth_middleware));

    Router::new()
        .merge(routes::health::router())
        .merge(openapi::router())
        .merge(gated)
        .layer(middleware::trace::layer())
        .with_state(state)
}
