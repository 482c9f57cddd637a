use super::*;
use crate::config::ApiConfig;
use bq_auth::AuthService;
use bq_core::{FakeClock, NodeIndex};
use bq_storage::Store;
use std::sync::Arc;

fn build_state() -> AppState<FakeClock> {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open"));
    let auth = Arc::new(AuthService::new(store.clone(), 86_400));
    std::mem::forget(dir);
    AppState::new(store, auth, Arc::new(ApiConfig::default()), FakeClock::new())
}

#[tokio::test]
async fn nodes_lists_known_nodes_with_busy_flag() {
    let state = build_state();
    state.store.upsert_node_reachability(NodeIndex(0), true, false).expect("upsert");
    state.store.upsert_node_reachability(NodeIndex(1), true, false).expect("upsert");

    let job = state
        .store
        .admit_job(
            "alice".to_string(),
            "a".to_string(),
            10,
            None,
            None,
            &[NodeIndex(0), NodeIndex(1)],
            30,
            5,
            1_000,
        )
        .expect("admit");
    state.store.set_node_current_job(job.node, Some(job.id)).expect("set current");

    let rows = nodes(State(state)).await.0;
    assert_eq!(rows.len(), 2);
    let busy_row = rows.iter().find(|n| n.index == job.node.0).expect("busy node present");
    assert!(busy_row.busy);
}

#[tokio::test]
async fn nodes_empty_when_no_node_has_ever_been_touched() {
    let state = build_state();
    let rows = nodes(State(state)).await.0;
    assert!(rows.is_empty());
}
