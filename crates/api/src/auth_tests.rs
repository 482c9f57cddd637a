use super::*;
use crate::config::ApiConfig;
use axum::http::Request;
use bq_auth::AuthService;
use bq_core::FakeClock;
use bq_storage::Store;
use std::sync::Arc;

fn build_state() -> (AppState<FakeClock>, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open"));
    let auth = Arc::new(AuthService::new(store.clone(), 86_400));
    let clock = FakeClock::new();
    let issued = auth.issue("alice".to_string(), false, u64::MAX, clock.epoch_ms()).expect("issue");
    // keep the tempdir alive for the lifetime of the store by leaking it;
    // the test only needs the store to outlive this function call.
    std::mem::forget(dir);
    let state = AppState::new(store, auth, Arc::new(ApiConfig::default()), clock);
    (state, issued.plaintext_secret)
}

#[tokio::test]
async fn rejects_missing_authorization_header() {
    let (state, _secret) = build_state();
    let req = Request::builder().uri("/status/job-x").body(()).expect("request");
    let (mut parts, ()) = req.into_parts();
    let result = AuthContext::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(e) if e.0.kind == bq_core::ErrorKind::Unauthenticated));
}

#[tokio::test]
async fn rejects_malformed_header() {
    let (state, _secret) = build_state();
    let req = Request::builder().uri("/status/job-x").header("authorization", "Basic xyz").body(()).expect("request");
    let (mut parts, ()) = req.into_parts();
    let result = AuthContext::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(e) if e.0.kind == bq_core::ErrorKind::Unauthenticated));
}

#[tokio::test]
async fn accepts_valid_bearer_credential() {
    let (state, secret) = build_state();
    let req = Request::builder()
        .uri("/status/job-x")
        .header("authorization", format!("Bearer {secret}"))
        .body(())
        .expect("request");
    let (mut parts, ()) = req.into_parts();
    let ctx = AuthContext::from_request_parts(&mut parts, &state).await.expect("authenticated");
    assert_eq!(ctx.principal, "alice");
    assert!(!ctx.is_admin);
}

#[test]
fn authorize_job_allows_owner_and_admin_and_hides_others_as_not_found() {
    let owner_ctx = AuthContext { principal: "alice".to_string(), is_admin: false };
    let admin_ctx = AuthContext { principal: "root".to_string(), is_admin: true };
    let stranger_ctx = AuthContext { principal: "bob".to_string(), is_admin: false };
    let job = bq_core::Job::builder().owner("alice").build();

    assert!(owner_ctx.authorize_job(&job).is_ok());
    assert!(admin_ctx.authorize_job(&job).is_ok());
    let err = stranger_ctx.authorize_job(&job).expect_err("should be denied");
    assert_eq!(err.0.kind, bq_core::ErrorKind::NotFound);
}
