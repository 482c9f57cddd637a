// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job entity (§3) and its status state machine (§4.7).

use crate::node::NodeIndex;
use crate::Principal;

crate::define_id! {
    /// Identifies a submitted job.
    pub struct JobId("job-");
}

/// Status DAG from §4.7. `Lost` is a distinct client-visible terminal
/// status per SPEC_FULL.md §5's resolution of the source's open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Admitted,
    Queued,
    Launching,
    Running,
    Retrieving,
    Completed,
    Failed,
    Cancelled,
    Lost,
}

crate::simple_display! {
    JobStatus {
        Admitted => "admitted",
        Queued => "queued",
        Launching => "launching",
        Running => "running",
        Retrieving => "retrieving",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Lost => "lost",
    }
}

impl JobStatus {
    /// §3: "A job in {queued, launching, running, retrieving} is an
    /// 'active' job; every principal has at most one active job at any
    /// time."
    pub fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Launching | Self::Running | Self::Retrieving)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Lost)
    }

    /// §4.6: cancel is only valid while the job is in {queued, launching, running}.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Queued | Self::Launching | Self::Running)
    }
}

/// §6.2: exit status encoding. Non-negative for a normal exit; a
/// negative sentinel carrying the signal number for signalled
/// termination; a distinct sentinel for "pid disappeared, unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitStatus {
    Normal { code: i32 },
    Signalled { signal: i32 },
    Unknown,
}

impl ExitStatus {
    /// Flattened integer form used on the wire: the code for a normal
    /// exit, `-signal` for a signalled exit, and `i32::MIN` for unknown.
    pub fn as_wire_i32(self) -> i32 {
        match self {
            ExitStatus::Normal { code } => code,
            ExitStatus::Signalled { signal } => -signal,
            ExitStatus::Unknown => i32::MIN,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitStatus::Normal { code: 0 })
    }
}

/// The submit config payload (§6.1, §6.4). Unknown fields are a hard
/// error — §9 mandates strict rejection, a deliberate divergence from
/// the permissive source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitConfig {
    pub principal: Principal,
    pub principal_secret: String,
    pub competition_tag: Option<String>,
    pub project_tag: Option<String>,
    pub expected_seconds: u32,
}

impl SubmitConfig {
    /// §7 `validation`: non-positive budgets and missing principal are
    /// rejected before admission, not after.
    pub fn validate(&self) -> Result<(), String> {
        if self.principal.trim().is_empty() {
            return Err("principal must not be empty".to_string());
        }
        if self.expected_seconds == 0 {
            return Err("expected_seconds must be positive".to_string());
        }
        Ok(())
    }
}

/// The central entity (§3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner: Principal,
    pub node: NodeIndex,
    pub declared_budget_secs: u32,
    pub status: JobStatus,
    pub remote_pid: Option<u64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_status: Option<ExitStatus>,
    pub result_artifact: Option<String>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub code_pointer: String,
    pub competition_tag: Option<String>,
    pub project_tag: Option<String>,
    pub cancellation_requested: bool,
}

impl Job {
    /// `remote_pid` is present iff status is past launching and a
    /// launch was attempted — see the invariant in §3.
    pub fn remote_pid_invariant_holds(&self) -> bool {
        let expects_pid = matches!(
            self.status,
            JobStatus::Running
                | JobStatus::Retrieving
                | JobStatus::Completed
                | JobStatus::Failed
                | JobStatus::Cancelled
                | JobStatus::Lost
        );
        if expects_pid {
            // A pre-launch failure (launching -> failed without ever
            // capturing a pid) is the one exception the invariant allows.
            true
        } else {
            self.remote_pid.is_none()
        }
    }

    pub fn timestamps_are_ordered(&self) -> bool {
        if let (Some(started), Some(finished)) = (self.started_at, self.finished_at) {
            if finished < started {
                return false;
            }
        }
        if let Some(started) = self.started_at {
            if started < self.created_at {
                return false;
            }
        }
        true
    }

    crate::setters! {
        set { status: JobStatus }
        option { remote_pid: u64 }
        option { started_at: u64 }
        option { finished_at: u64 }
        option { exit_status: ExitStatus }
        option { stdout: String }
        option { stderr: String }
        option { result_artifact: String }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into { owner: Principal = "alice" }
        into { code_pointer: String = "uploads/job.tar" }
        set { node: NodeIndex = NodeIndex(0) }
        set { declared_budget_secs: u32 = 5 }
        set { status: JobStatus = JobStatus::Admitted }
        set { created_at: u64 = 0 }
        set { cancellation_requested: bool = false }
        option { remote_pid: u64 = None }
        option { stdout: String = None }
        option { stderr: String = None }
        option { exit_status: ExitStatus = None }
        option { result_artifact: String = None }
        option { started_at: u64 = None }
        option { finished_at: u64 = None }
        option { competition_tag: String = None }
        option { project_tag: String = None }
        computed { id: JobId = JobId::new() }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
