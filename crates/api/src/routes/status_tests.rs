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
async fn status_returns_queue_position_and_fields_for_owner() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let result = status(State(state), auth, Path(job.id.as_str().to_string())).await.expect("status ok");
    assert_eq!(result.0.job_id, job.id);
    assert_eq!(result.0.status, JobStatus::Queued);
    assert_eq!(result.0.queue_position, Some(0));
}

#[tokio::test]
async fn status_hides_other_principals_jobs_as_not_found() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "bob".to_string(), is_admin: false };
    let err = status(State(state), auth, Path(job.id.as_str().to_string())).await.expect_err("should be denied");
    assert_eq!(err.0.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn status_admin_can_see_any_job() {
    let (state, clock) = build_state();
    let job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "root".to_string(), is_admin: true };
    let result = status(State(state), auth, Path(job.id.as_str().to_string())).await.expect("status ok");
    assert_eq!(result.0.job_id, job.id);
}

#[tokio::test]
async fn status_unknown_id_is_not_found() {
    let (state, _clock) = build_state();
    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let err = status(State(state), auth, Path("bq-job-nonexistent".to_string())).await.expect_err("should error");
    assert_eq!(err.0.kind, ErrorKind::NotFound);
}
