//! # Request Tracing
//!
//! `tower_http::trace::TraceLayer` with spans carrying method, URI, and
//! status. Request headers are deliberately excluded from spans: the
//! `Authorization` header holds a live credential.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build the trace layer wrapped around the whole router.
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
