//! # Integration Tests for lia-api
//!
//! Drives the assembled router end to end: health probes, the auth gate in
//! front of `/api/auth/me`, the error envelope for every rejection kind,
//! concurrent verdicts, and the open documentation endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use lia_api::auth::{auth_middleware, AuthGate, AuthenticatedUser};
use lia_api::db::{ConnectionHealth, HealthTrackedStore};
use lia_api::state::AppState;
use lia_api::store::InMemoryIdentityStore;
use lia_core::{TokenCodec, UserId, UserStatus};
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-test-secret";

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

fn codec() -> TokenCodec {
    TokenCodec::new(SECRET, Duration::hours(1)).unwrap()
}

/// Helper: build the app over the given store with an in-memory health tracker.
fn test_app(store: &InMemoryIdentityStore) -> Router {
    let state = AppState::new(
        codec(),
        Arc::new(store.clone()),
        Arc::new(ConnectionHealth::in_memory()),
    );
    lia_api::app(state)
}

/// Helper: a store holding one active user `u1`.
fn store_with_u1() -> InMemoryIdentityStore {
    let store = InMemoryIdentityStore::new();
    store.upsert(UserStatus::active(uid("u1")));
    store
}

fn token_for(id: &str) -> String {
    codec().issue(&uid(id)).unwrap().token
}

fn me_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Assert a rejection envelope with the given status and code.
async fn assert_rejected(response: axum::http::Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    assert!(body["error"].is_string());
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app(&InMemoryIdentityStore::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_in_memory() {
    let app = test_app(&InMemoryIdentityStore::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_readiness_probe_waits_for_database() {
    let health = Arc::new(ConnectionHealth::database());
    let state = AppState::new(
        codec(),
        Arc::new(InMemoryIdentityStore::new()),
        health.clone(),
    );
    let app = lia_api::app(state);

    let probe = || {
        Request::builder()
            .uri("/health/readiness")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(probe()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");

    health.record_attempt();
    health.record_connected();
    let response = app.oneshot(probe()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_follows_identity_store_outage() {
    let health = Arc::new(ConnectionHealth::database());
    health.record_attempt();
    health.record_connected();
    let store = store_with_u1();
    let state = AppState::new(
        codec(),
        Arc::new(HealthTrackedStore::new(store.clone(), health.clone())),
        health.clone(),
    );
    let app = lia_api::app(state);
    let header = format!("Bearer {}", token_for("u1"));

    let readiness = || {
        Request::builder()
            .uri("/health/readiness")
            .body(Body::empty())
            .unwrap()
    };

    store.set_unavailable(true);
    let response = app.clone().oneshot(me_request(Some(&header))).await.unwrap();
    assert_rejected(response, StatusCode::INTERNAL_SERVER_ERROR, "IDENTITY_LOOKUP_FAILED").await;
    let response = app.clone().oneshot(readiness()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    store.set_unavailable(false);
    let response = app.clone().oneshot(me_request(Some(&header))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(readiness()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_not_gated() {
    let store = InMemoryIdentityStore::new();
    store.set_unavailable(true);
    let app = test_app(&store);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .header("Authorization", "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Auth Gate: accepted ------------------------------------------------------

#[tokio::test]
async fn test_me_returns_subject_for_valid_token() {
    let app = test_app(&store_with_u1());
    let token = token_for("u1");

    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userId"], "u1");
}

#[tokio::test]
async fn test_token_issued_before_reactivation_is_accepted_again() {
    let store = store_with_u1();
    let app = test_app(&store);
    let header = format!("Bearer {}", token_for("u1"));

    store.set_active(&uid("u1"), false);
    let response = app.clone().oneshot(me_request(Some(&header))).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "TOKEN_NO_LONGER_VALID").await;

    store.set_active(&uid("u1"), true);
    let response = app.oneshot(me_request(Some(&header))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Auth Gate: rejected ------------------------------------------------------

#[tokio::test]
async fn test_missing_header_is_missing_token() {
    let app = test_app(&store_with_u1());
    let response = app.oneshot(me_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "MISSING_TOKEN");
    assert_eq!(body["error"], "Access token required");
}

#[tokio::test]
async fn test_wrong_scheme_is_missing_token() {
    let token = token_for("u1");
    for header in [
        format!("bearer {token}"),
        format!("Token {token}"),
        format!("Bearer  {token}"),
        token.clone(),
        "Bearer ".to_string(),
    ] {
        let app = test_app(&store_with_u1());
        let response = app.oneshot(me_request(Some(&header))).await.unwrap();
        assert_rejected(response, StatusCode::UNAUTHORIZED, "MISSING_TOKEN").await;
    }
}

#[tokio::test]
async fn test_tampered_token_is_invalid() {
    let app = test_app(&store_with_u1());
    let mut token = token_for("u1");
    let last = token.pop().unwrap();
    token.push(if last == 'A' { 'B' } else { 'A' });

    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN").await;
}

#[tokio::test]
async fn test_foreign_secret_is_invalid() {
    let app = test_app(&store_with_u1());
    let foreign = TokenCodec::new(b"another-deployment", Duration::hours(1)).unwrap();
    let token = foreign.issue(&uid("u1")).unwrap().token;

    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN").await;
}

#[tokio::test]
async fn test_expired_token_is_expired() {
    let app = test_app(&store_with_u1());
    let token = codec()
        .issue_at(&uid("u1"), Utc::now() - Duration::hours(2))
        .unwrap()
        .token;

    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_deactivated_user_is_no_longer_valid() {
    let store = store_with_u1();
    let app = test_app(&store);
    let token = token_for("u1");

    store.set_active(&uid("u1"), false);
    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "TOKEN_NO_LONGER_VALID").await;
}

#[tokio::test]
async fn test_deleted_user_is_no_longer_valid() {
    let store = store_with_u1();
    let app = test_app(&store);
    let token = token_for("u1");

    store.remove(&uid("u1"));
    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "TOKEN_NO_LONGER_VALID").await;
}

#[tokio::test]
async fn test_store_outage_is_server_error() {
    let store = store_with_u1();
    let app = test_app(&store);
    let token = token_for("u1");

    store.set_unavailable(true);
    let response = app
        .oneshot(me_request(Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "IDENTITY_LOOKUP_FAILED");
    assert!(!body["error"].as_str().unwrap().contains("in-memory"));
}

// -- Handler invocation -------------------------------------------------------
//
// A counting handler behind the gate: it must run exactly once per accepted
// request and never for a rejected one.

fn counting_app(store: &InMemoryIdentityStore, hits: Arc<AtomicUsize>) -> Router {
    let gate = AuthGate::new(Arc::new(codec()), Arc::new(store.clone()));
    Router::new()
        .route(
            "/protected",
            get(move |user: AuthenticatedUser| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    user.user_id.into_inner()
                }
            }),
        )
        .route_layer(from_fn_with_state(gate, auth_middleware))
}

fn protected(authorization: &str) -> Request<Body> {
    Request::builder()
        .uri("/protected")
        .header("Authorization", authorization)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_handler_runs_once_on_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = counting_app(&store_with_u1(), hits.clone());

    let response = app
        .oneshot(protected(&format!("Bearer {}", token_for("u1"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "u1");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_never_runs_on_rejection() {
    let hits = Arc::new(AtomicUsize::new(0));
    let store = store_with_u1();
    let app = counting_app(&store, hits.clone());
    let valid = format!("Bearer {}", token_for("u1"));

    let response = app.clone().oneshot(protected("Bearer not-a-jwt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    store.set_unavailable(true);
    let response = app.oneshot(protected(&valid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// -- Concurrency --------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_independent_verdicts() {
    let store = store_with_u1();
    store.upsert(UserStatus::active(uid("u2")));
    let app = test_app(&store);

    let valid_u1 = format!("Bearer {}", token_for("u1"));
    let valid_u2 = format!("Bearer {}", token_for("u2"));
    let expired = format!(
        "Bearer {}",
        codec()
            .issue_at(&uid("u1"), Utc::now() - Duration::days(30))
            .unwrap()
            .token
    );

    let mut handles = Vec::new();
    for i in 0..40 {
        let app = app.clone();
        let (header, expected) = match i % 5 {
            0 => (Some(valid_u1.clone()), Ok("u1")),
            1 => (Some(valid_u2.clone()), Ok("u2")),
            2 => (Some(expired.clone()), Err("TOKEN_EXPIRED")),
            3 => (Some("Bearer not-a-jwt".to_string()), Err("INVALID_TOKEN")),
            _ => (Some("Basic dXNlcjpwYXNz".to_string()), Err("MISSING_TOKEN")),
        };
        handles.push(tokio::spawn(async move {
            let response = app.oneshot(me_request(header.as_deref())).await.unwrap();
            let status = response.status();
            let body = body_json(response).await;
            (expected, status, body)
        }));
    }

    for handle in handles {
        let (expected, status, body) = handle.await.unwrap();
        match expected {
            Ok(user) => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body["data"]["userId"], user);
            }
            Err(code) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body["code"], code);
            }
        }
    }
}

// -- Open Endpoints -----------------------------------------------------------

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let app = test_app(&InMemoryIdentityStore::new());
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let app = test_app(&InMemoryIdentityStore::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/auth/me"].is_object());
}

#[tokio::test]
async fn test_unknown_path_is_not_found_not_unauthorized() {
    let app = test_app(&InMemoryIdentityStore::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
