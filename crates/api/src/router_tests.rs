use super::*;
use crate::config::ApiConfig;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use bq_auth::AuthService;
use bq_core::{FakeClock, NodeIndex};
use bq_storage::Store;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn build_state() -> (AppState<FakeClock>, String, FakeClock) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open"));
    let auth = Arc::new(AuthService::new(store.clone(), 86_400));
    let clock = FakeClock::new();
    let issued = auth.issue("alice".to_string(), false, u64::MAX, clock.epoch_ms()).expect("issue");
    std::mem::forget(dir);
    let state = AppState::new(store, auth, Arc::new(ApiConfig::default()), clock.clone());
    (state, issued.plaintext_secret, clock)
}

#[tokio::test]
async fn nodes_is_reachable_without_authentication() {
    let (state, _secret, _clock) = build_state();
    let router = build_router(state);
    let req = Request::builder().uri("/nodes").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_without_bearer_is_unauthenticated() {
    let (state, _secret, _clock) = build_state();
    let router = build_router(state);
    let req = Request::builder().uri("/status/job-x").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_round_trips_through_the_router_for_the_owning_principal() {
    let (state, secret, clock) = build_state();
    let job = state
        .store
        .admit_job(
            "alice".to_string(),
            "a".to_string(),
            10,
            None,
            None,
            &[NodeIndex(0)],
            30,
            5,
            clock.epoch_ms(),
        )
        .expect("admit");
    let router = build_router(state);

    let req = Request::builder()
        .uri(format!("/status/{}", job.id.as_str()))
        .header("authorization", format!("Bearer {secret}"))
        .body(Body::empty())
        .expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(json["job_id"], job.id.as_str());
}

#[tokio::test]
async fn unknown_job_renders_as_not_found_with_the_error_envelope() {
    let (state, secret, _clock) = build_state();
    let router = build_router(state);

    let req = Request::builder()
        .uri("/status/bq-job-totally-unknown")
        .header("authorization", format!("Bearer {secret}"))
        .body(Body::empty())
        .expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(json["error"]["kind"], "not-found");
}
