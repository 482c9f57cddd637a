// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Raw exit signal from a remote `exec` — deliberately not
/// `bq_core::ExitStatus`. The transport does not know what a "job" is
/// (§4.2's non-contract); translating this into the job's wire status
/// is `bq-engine`'s job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteExit {
    Code(i32),
    Signal(i32),
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: RemoteExit,
}

/// The resilient command channel to one compute node (C2, §4.2).
/// One instance per node, owned exclusively by that node's worker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish (or re-establish) the two-hop session.
    async fn connect(&self) -> Result<(), TransportError>;

    async fn exec(&self, cmd: &str, timeout: Duration) -> Result<ExecOutput, TransportError>;

    async fn put_file(&self, local_bytes: &[u8], remote_path: &str) -> Result<(), TransportError>;

    async fn read_file(&self, remote_path: &str) -> Result<Vec<u8>, TransportError>;

    async fn is_alive_pid(&self, pid: u64) -> Result<bool, TransportError>;

    /// Best-effort termination, escalating signals (§4.2). Returns
    /// success only once the pid is no longer observable.
    async fn kill_pid(&self, pid: u64) -> Result<(), TransportError>;

    /// Lightweight liveness check; never reconnects, never errors.
    async fn is_channel_alive(&self) -> bool;
}
