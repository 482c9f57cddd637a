// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire response shapes (§6.1, §6.3). Every type here is output-only —
//! inbound payloads live in `bq_core::SubmitConfig`, the one spot the
//! wire surface accepts caller-supplied structure.

use bq_core::{Job, JobId, JobStatus};
use serde::Serialize;
use std::collections::HashMap;

/// Flatten a job's `node` and `exit_status` the same way on every
/// response — `NodeIndex` and `ExitStatus` are internal types that
/// serialize to wire-friendly primitives here rather than via their
/// own `Serialize` impls, so every handler renders them identically.
fn exit_status_wire(job: &Job) -> Option<i32> {
    job.exit_status.map(|e| e.as_wire_i32())
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub node: u32,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
}

impl SubmitResponse {
    /// Build the bare admission response (`wait=false`, or `wait=true`
    /// that hit `wait_max_seconds` before the job finished) — §6.1:
    /// "on that maximum, it returns status=running with the job id."
    pub fn pending(job: &Job) -> Self {
        Self {
            job_id: job.id,
            node: job.node.0,
            status: job.status,
            stdout: None,
            stderr: None,
            exit_status: None,
        }
    }

    /// Build the response for a `wait=true` submit that reached a
    /// terminal status before `wait_max_seconds` elapsed — §6.1:
    /// "[outputs if wait & finished in time]".
    pub fn finished(job: &Job) -> Self {
        Self {
            job_id: job.id,
            node: job.node.0,
            status: job.status,
            stdout: job.result_artifact.clone().or_else(|| job.stdout.clone()),
            stderr: job.stderr.clone(),
            exit_status: exit_status_wire(job),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub node: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
}

impl StatusResponse {
    pub fn from_job(job: &Job, queue_position: Option<usize>) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            node: job.node.0,
            queue_position,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            exit_status: exit_status_wire(job),
        }
    }
}

/// §6.1 Results: "stdout (result artifact contents)" — the source
/// table names the field `stdout` but annotates it as carrying the
/// result artifact, confirmed by spec §8 scenario 1 (a job that prints
/// `"ok"` to its process stdout but writes `{"ok":true}` to its result
/// artifact expects `results.stdout` to contain the artifact's JSON).
/// Resolved here: `stdout` = result artifact when one was written,
/// falling back to the raw process stdout capture for jobs that never
/// produced one (e.g. a job killed mid-run, §8 scenario 4).
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

impl ResultsResponse {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            stdout: job.result_artifact.clone().or_else(|| job.stdout.clone()),
            stderr: job.stderr.clone(),
            exit_status: exit_status_wire(job),
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// One row of `GET /jobs`. `owner` is included unconditionally — for a
/// non-admin caller every row is already their own job (§4.8's
/// ownership filter), so the field is redundant but harmless; for an
/// admin it is the only way to tell whose job is whose.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub owner: String,
    pub status: JobStatus,
    pub node: u32,
    pub declared_budget_secs: u32,
    pub created_at: u64,
    pub finished_at: Option<u64>,
}

impl JobSummary {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            owner: job.owner.clone(),
            status: job.status,
            node: job.node.0,
            declared_budget_secs: job.declared_budget_secs,
            created_at: job.created_at,
            finished_at: job.finished_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeStats {
    pub index: u32,
    pub projected_queue_secs: u64,
    pub busy: bool,
    pub address_tag: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveJobEntry {
    pub job_id: JobId,
    pub owner: String,
    pub status: JobStatus,
    pub node: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NodeQueueDescriptor {
    pub index: u32,
    pub queue_size: usize,
    pub projected_queue_secs: u64,
    pub busy: bool,
    pub current_job: Option<JobSummary>,
}

#[derive(Debug, Serialize)]
pub struct HealthAggregates {
    pub node_utilization_percent: f64,
    pub average_projected_queue_secs: f64,
    pub success_ratio: f64,
    pub submissions_last_24h: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Job counts grouped by status — global for admin, self-filtered
    /// otherwise (§6.3).
    pub job_counts: HashMap<JobStatus, usize>,
    pub nodes: Vec<NodeQueueDescriptor>,
    pub active_jobs: Vec<ActiveJobEntry>,
    pub recent_terminal: Vec<JobSummary>,
    pub health: HealthAggregates,
}
