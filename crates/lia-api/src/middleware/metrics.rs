//! # Prometheus Metrics
//!
//! Auth-gate counters recorded through the `metrics` facade. When no
//! recorder is installed (unit tests, embedded use) the macros are no-ops.
//!
//! | Metric | Labels |
//! |---|---|
//! | `lia_auth_accepted_total` | none |
//! | `lia_auth_rejected_total` | `code` |

use axum::extract::State;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::error::AppError;
use crate::state::AppState;

pub const AUTH_ACCEPTED: &str = "lia_auth_accepted_total";
pub const AUTH_REJECTED: &str = "lia_auth_rejected_total";

/// Count a request that passed the gate.
pub fn record_accepted() {
    metrics::counter!(AUTH_ACCEPTED).increment(1);
}

/// Count a request turned away at the gate, labelled with its error code.
pub fn record_rejected(code: &'static str) {
    metrics::counter!(AUTH_REJECTED, "code" => code).increment(1);
}

/// Install the process-wide Prometheus recorder.
///
/// Call once from the binary entry point; a second call fails.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(AUTH_ACCEPTED, "Requests that passed the auth gate");
    metrics::describe_counter!(AUTH_REJECTED, "Requests rejected by the auth gate, by code");
    Ok(handle)
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Result<String, AppError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| AppError::NotFound("metrics recorder not installed".into()))
}
