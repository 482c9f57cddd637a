use super::*;
use crate::auth::AuthContext;
use crate::config::ApiConfig;
use bq_auth::AuthService;
use bq_core::{ErrorKind, FakeClock, JobStatus, NodeIndex};
use bq_storage::Store;
use std::sync::Arc;

fn build_state() -> (AppState<FakeClock>, FakeClock) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open"));
    let auth = Arc::new(AuthService::new(store.clone(), 86_400));
    let clock = FakeClock::new();
    std::mem::forget(dir);
    (AppState::new(store, auth, Arc::new(ApiConfig::default()), clock.clone()), clock)
}

fn nodes3() -> Vec<NodeIndex> {
    vec![NodeIndex(0), NodeIndex(1), NodeIndex(2)]
}

#[tokio::test]
async fn cancel_queued_job_reports_cancelled_immediately() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let result = cancel(State(state), auth, Path(job.id.as_str().to_string())).await.expect("cancel ok");
    assert_eq!(result.0.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancel_running_job_reports_running_not_a_literal() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");
    state.store.set_job_status(job.id, JobStatus::Running, clock.epoch_ms()).expect("running");

    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let result = cancel(State(state), auth, Path(job.id.as_str().to_string())).await.expect("cancel ok");
    assert_eq!(result.0.status, JobStatus::Running);

    let job = state.store.read_job(job.id).expect("read");
    assert!(job.cancellation_requested);
}

#[tokio::test]
async fn cancel_terminal_job_is_rejected() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");
    state.store.set_job_status(job.id, JobStatus::Running, clock.epoch_ms()).expect("running");
    state.store.set_job_status(job.id, JobStatus::Completed, clock.epoch_ms()).expect("completed");

    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let err = cancel(State(state), auth, Path(job.id.as_str().to_string())).await.expect_err("should be rejected");
    assert_eq!(err.0.kind, ErrorKind::TerminalState);
}

#[tokio::test]
async fn cancel_denies_non_owner_as_not_found() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "bob".to_string(), is_admin: false };
    let err = cancel(State(state), auth, Path(job.id.as_str().to_string())).await.expect_err("should be denied");
    assert_eq!(err.0.kind, ErrorKind::NotFound);
}
