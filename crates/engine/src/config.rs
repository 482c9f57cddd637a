// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker tuning (§4.7, §6.4). One `WorkerConfig` per node; the
//! `bqd` bootstrap builds one from the daemon's parsed configuration
//! per node index.

use bq_core::NodeIndex;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub node: NodeIndex,
    /// Remote directory a job's artifact and logs are staged under,
    /// with `{job_id}` substituted per job.
    pub remote_workdir_template: String,
    /// How to invoke the uploaded artifact; `{artifact}` is substituted
    /// with its uploaded path. The transport (§4.2's non-contract)
    /// neither knows nor cares what this command does.
    pub launch_command_template: String,
    /// §6.4 `restart_remote_workspace`: best-effort workspace reset
    /// before each job, failure logged and ignored.
    pub restart_remote_workspace: bool,
    pub workspace_reset_command: String,
    /// §6.4 `wall_clock_multiplier`, K in §4.7's timeout policy.
    pub wall_clock_multiplier: u32,
    /// §4.7 supervision poll interval.
    pub supervision_poll_interval: Duration,
    /// Sleep between empty-queue polls.
    pub idle_poll_interval: Duration,
    /// Timeout for short control execs (workspace reset, launch, kill,
    /// liveness probes) — distinct from the job's own wall-clock budget.
    pub control_exec_timeout: Duration,
    /// How many consecutive supervision-poll transport failures are
    /// tolerated (each triggering a reconnect attempt) before a job
    /// whose pid can no longer be observed is given up on as `lost`
    /// (§4.7: "reconnection itself fails beyond a bounded budget").
    pub max_supervision_reconnect_failures: u32,
    /// In-process retry budget for a pre-launch failure (upload or
    /// launch exec) before the job is given up on as `failed`. Not
    /// persisted — a crash mid-retry simply reconciles as `lost` on
    /// restart (§4.7 crash recovery), so this only smooths over a
    /// transient hiccup within one worker's lifetime.
    pub launch_retry_attempts: u32,
    pub launch_retry_delay: Duration,
}

impl WorkerConfig {
    pub fn new(node: NodeIndex) -> Self {
        Self {
            node,
            remote_workdir_template: "bq-jobs/{job_id}".to_string(),
            launch_command_template: "sh {artifact}".to_string(),
            restart_remote_workspace: false,
            workspace_reset_command: "rm -rf bq-jobs && mkdir -p bq-jobs".to_string(),
            wall_clock_multiplier: 2,
            supervision_poll_interval: Duration::from_secs(2),
            idle_poll_interval: Duration::from_millis(500),
            control_exec_timeout: Duration::from_secs(10),
            max_supervision_reconnect_failures: 5,
            launch_retry_attempts: 3,
            launch_retry_delay: Duration::from_millis(500),
        }
    }

    pub fn remote_workdir(&self, job_id: bq_core::JobId) -> String {
        self.remote_workdir_template.replace("{job_id}", &job_id.to_string())
    }

    pub fn launch_command(&self, artifact_path: &str) -> String {
        self.launch_command_template.replace("{artifact}", artifact_path)
    }

    pub fn wall_clock_deadline_secs(&self, declared_budget_secs: u32) -> u64 {
        declared_budget_secs as u64 * self.wall_clock_multiplier as u64
    }
}
