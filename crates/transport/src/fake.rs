// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Transport`] double for engine/worker tests (§9's
//! "substitute the network" testing posture) — no real bastion or SSH
//! hop, just a scripted process table a test can drive directly.

use crate::error::TransportError;
use crate::transport::{ExecOutput, RemoteExit, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FakeProcess {
    alive: bool,
}

#[derive(Default)]
struct State {
    processes: HashMap<u64, FakeProcess>,
    files: HashMap<String, Vec<u8>>,
    next_exec_result: Option<Result<ExecOutput, TransportError>>,
    exec_log: Vec<String>,
}

/// Cheap to clone; shares state through an `Arc` so a test can hold one
/// handle, hand a clone to the code under test, and assert on exec
/// history afterwards.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
    connected: Arc<AtomicBool>,
    next_pid: Arc<AtomicU64>,
    /// Test-only fault injection, independent of `connected` so existing
    /// liveness/kill behavior keeps working without a prior `connect()`.
    fail_pid_checks: Arc<AtomicBool>,
    fail_reconnects: Arc<AtomicBool>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            connected: Arc::new(AtomicBool::new(false)),
            next_pid: Arc::new(AtomicU64::new(1000)),
            fail_pid_checks: Arc::new(AtomicBool::new(false)),
            fail_reconnects: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a pid as alive, simulating a just-launched remote
    /// process without going through `exec`.
    pub fn spawn_pid(&self) -> u64 {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.state.lock().processes.insert(pid, FakeProcess { alive: true });
        pid
    }

    pub fn mark_dead(&self, pid: u64) {
        if let Some(p) = self.state.lock().processes.get_mut(&pid) {
            p.alive = false;
        }
    }

    pub fn queue_exec_result(&self, result: Result<ExecOutput, TransportError>) {
        self.state.lock().next_exec_result = Some(result);
    }

    pub fn exec_log(&self) -> Vec<String> {
        self.state.lock().exec_log.clone()
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Simulate a node that has gone dark: liveness/kill probes fail
    /// and reconnection never succeeds, for exercising the supervisor's
    /// reconnect-budget-exhausted → `lost` path.
    pub fn go_unreachable(&self) {
        self.fail_pid_checks.store(true, Ordering::SeqCst);
        self.fail_reconnects.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.fail_reconnects.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelDead("fake transport is unreachable".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn exec(&self, cmd: &str, _timeout: Duration) -> Result<ExecOutput, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelDead("fake transport not connected".to_string()));
        }
        let mut state = self.state.lock();
        state.exec_log.push(cmd.to_string());
        state
            .next_exec_result
            .take()
            .unwrap_or(Ok(ExecOutput { stdout: String::new(), stderr: String::new(), exit: RemoteExit::Code(0) }))
    }

    async fn put_file(&self, local_bytes: &[u8], remote_path: &str) -> Result<(), TransportError> {
        self.state.lock().files.insert(remote_path.to_string(), local_bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        self.state
            .lock()
            .files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| TransportError::Io(format!("no such file: {remote_path}")))
    }

    async fn is_alive_pid(&self, pid: u64) -> Result<bool, TransportError> {
        if self.fail_pid_checks.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelDead("fake transport unreachable".to_string()));
        }
        Ok(self.state.lock().processes.get(&pid).map(|p| p.alive).unwrap_or(false))
    }

    async fn kill_pid(&self, pid: u64) -> Result<(), TransportError> {
        if self.fail_pid_checks.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelDead("fake transport unreachable".to_string()));
        }
        if let Some(p) = self.state.lock().processes.get_mut(&pid) {
            p.alive = false;
        }
        Ok(())
    }

    async fn is_channel_alive(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
