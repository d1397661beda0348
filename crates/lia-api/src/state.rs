//! # Application State
//!
//! Shared state handed to route handlers via the `State` extractor.
//!
//! The auth gate is the only piece that touches credentials. Connection
//! health is an explicit `Arc` shared with the database connector so the
//! readiness probe sees live counters.

use std::sync::Arc;

use lia_core::TokenCodec;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::AuthGate;
use crate::db::ConnectionHealth;
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub health: Arc<ConnectionHealth>,
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("health", &self.health.snapshot())
            .field("metrics", &self.metrics.as_ref().map(|_| "[installed]"))
            .finish()
    }
}

impl AppState {
    /// Assemble state from a token codec, an identity store, and the
    /// connection health tracker for that store.
    pub fn new(
        codec: TokenCodec,
        store: Arc<dyn IdentityStore>,
        health: Arc<ConnectionHealth>,
    ) -> Self {
        Self {
            gate: AuthGate::new(Arc::new(codec), store),
            health,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle so `/metrics` can render.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
