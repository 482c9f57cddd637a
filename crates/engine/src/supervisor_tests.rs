// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::{FakeClock, JobStatus, NodeIndex};
use bq_storage::Store;
use bq_transport::FakeTransport;
use tempfile::tempdir;

fn running_job(store: &Store) -> bq_core::Job {
    let job = store
        .admit_job("alice".to_string(), "a".to_string(), 5, None, None, &[NodeIndex(0)], 10, 1, 1_000)
        .expect("admit");
    let claimed = store.claim_next_for_node(NodeIndex(0), 1_100).expect("claim").expect("a job");
    store.set_job_status(claimed.id, JobStatus::Running, 1_150).expect("running");
    let _ = job;
    store.read_job(claimed.id).expect("read")
}

#[tokio::test]
async fn pid_exit_without_cancellation_is_reported_as_uncancelled() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path()).expect("open");
    let job = running_job(&store);

    let transport = FakeTransport::new();
    transport.connect().await.expect("connect");
    let pid = transport.spawn_pid();

    let mut config = WorkerConfig::new(NodeIndex(0));
    config.supervision_poll_interval = std::time::Duration::from_millis(1);
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_150);

    let transport_for_kill = transport.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        transport_for_kill.mark_dead(pid);
    });

    let outcome = supervise(&transport, &store, &config, &clock, &job, pid).await;
    assert!(matches!(outcome, Outcome::Exited { cancelled: false }));
}

#[tokio::test]
async fn wall_clock_budget_exceeded_triggers_kill() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path()).expect("open");
    let job = running_job(&store);

    let transport = FakeTransport::new();
    transport.connect().await.expect("connect");
    let pid = transport.spawn_pid();

    let mut config = WorkerConfig::new(NodeIndex(0));
    config.supervision_poll_interval = std::time::Duration::from_millis(1);
    config.wall_clock_multiplier = 1;
    let clock = FakeClock::new();
    // started_at (1_150) + K(1) * declared_budget(5) * 1000 = 6_150; already past it.
    clock.set_epoch_ms(10_000);

    let outcome = supervise(&transport, &store, &config, &clock, &job, pid).await;
    assert!(matches!(outcome, Outcome::Exited { cancelled: true }));
    assert!(!transport.is_alive_pid(pid).await.expect("alive check"));
}

#[tokio::test]
async fn reconnect_budget_exhausted_reports_lost() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path()).expect("open");
    let job = running_job(&store);

    let transport = FakeTransport::new();
    transport.connect().await.expect("connect");
    let pid = transport.spawn_pid();
    transport.go_unreachable();

    let mut config = WorkerConfig::new(NodeIndex(0));
    config.supervision_poll_interval = std::time::Duration::from_millis(1);
    config.max_supervision_reconnect_failures = 2;
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_150);

    let outcome = supervise(&transport, &store, &config, &clock, &job, pid).await;
    assert!(matches!(outcome, Outcome::Lost));
}

#[tokio::test]
async fn cancellation_flag_triggers_kill_and_exits_as_cancelled() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path()).expect("open");
    let job = running_job(&store);
    store.set_job_cancellation_requested(job.id).expect("request cancel");

    let transport = FakeTransport::new();
    transport.connect().await.expect("connect");
    let pid = transport.spawn_pid();

    let mut config = WorkerConfig::new(NodeIndex(0));
    config.supervision_poll_interval = std::time::Duration::from_millis(1);
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_150);

    let outcome = supervise(&transport, &store, &config, &clock, &job, pid).await;
    assert!(matches!(outcome, Outcome::Exited { cancelled: true }));
}
