use super::*;
use crate::auth::AuthContext;
use crate::config::ApiConfig;
use bq_auth::AuthService;
use bq_core::{FakeClock, JobStatus, NodeIndex};
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
async fn non_admin_dashboard_is_scoped_to_own_jobs() {
    let (state, clock) = build_state();
    let alice_job = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");
    state
        .store
        .admit_job("bob".to_string(), "b".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");

    let auth = AuthContext { principal: "alice".to_string(), is_admin: false };
    let result = dashboard(State(state), auth).await.0;
    assert_eq!(result.active_jobs.len(), 1);
    assert_eq!(result.active_jobs[0].job_id, alice_job.id);
    let total: usize = result.job_counts.values().sum();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn admin_dashboard_sees_everyone_and_success_ratio_reflects_terminal_jobs() {
    let (state, clock) = build_state();
    let completed = state
        .store
        .admit_job("alice".to_string(), "a".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");
    state.store.set_job_status(completed.id, JobStatus::Running, clock.epoch_ms()).expect("running");
    state.store.set_job_status(completed.id, JobStatus::Completed, clock.epoch_ms()).expect("completed");

    let failed = state
        .store
        .admit_job("bob".to_string(), "b".to_string(), 10, None, None, &nodes3(), 30, 5, clock.epoch_ms())
        .expect("admit");
    state.store.set_job_status(failed.id, JobStatus::Running, clock.epoch_ms()).expect("running");
    state.store.set_job_status(failed.id, JobStatus::Failed, clock.epoch_ms()).expect("failed");

    let auth = AuthContext { principal: "root".to_string(), is_admin: true };
    let result = dashboard(State(state), auth).await.0;
    assert_eq!(result.recent_terminal.len(), 2);
    assert!((result.health.success_ratio - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn dashboard_with_no_jobs_has_perfect_success_ratio_and_no_utilization() {
    let (state, _clock) = build_state();
    let auth = AuthContext { principal: "root".to_string(), is_admin: true };
    let result = dashboard(State(state), auth).await.0;
    assert_eq!(result.health.success_ratio, 1.0);
    assert_eq!(result.health.node_utilization_percent, 0.0);
}
