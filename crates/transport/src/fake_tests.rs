// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn exec_before_connect_reports_channel_dead() {
    let t = FakeTransport::new();
    let err = t.exec("echo hi", Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, TransportError::ChannelDead(_)));
}

#[tokio::test]
async fn exec_records_command_and_returns_queued_result() {
    let t = FakeTransport::new();
    t.connect().await.unwrap();
    t.queue_exec_result(Ok(ExecOutput { stdout: "ok".to_string(), stderr: String::new(), exit: RemoteExit::Code(0) }));
    let out = t.exec("run.sh", Duration::from_secs(1)).await.unwrap();
    assert_eq!(out.stdout, "ok");
    assert_eq!(t.exec_log(), vec!["run.sh".to_string()]);
}

#[tokio::test]
async fn spawned_pid_is_alive_until_marked_dead() {
    let t = FakeTransport::new();
    let pid = t.spawn_pid();
    assert!(t.is_alive_pid(pid).await.unwrap());
    t.mark_dead(pid);
    assert!(!t.is_alive_pid(pid).await.unwrap());
}

#[tokio::test]
async fn kill_pid_marks_process_dead() {
    let t = FakeTransport::new();
    let pid = t.spawn_pid();
    t.kill_pid(pid).await.unwrap();
    assert!(!t.is_alive_pid(pid).await.unwrap());
}

#[tokio::test]
async fn put_then_read_file_round_trips() {
    let t = FakeTransport::new();
    t.put_file(b"payload", "/tmp/out").await.unwrap();
    let bytes = t.read_file("/tmp/out").await.unwrap();
    assert_eq!(bytes, b"payload");
}

#[tokio::test]
async fn disconnect_marks_channel_not_alive() {
    let t = FakeTransport::new();
    t.connect().await.unwrap();
    assert!(t.is_channel_alive().await);
    t.disconnect();
    assert!(!t.is_channel_alive().await);
}
