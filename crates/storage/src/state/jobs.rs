// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job event handlers.

use bq_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobAdmitted { job } => {
            // Idempotent: a job id is only ever inserted once. §3's
            // placement invariant ("node is set exactly once") depends
            // on this insert never overwriting an existing row.
            state.jobs.entry(job.id).or_insert_with(|| (**job).clone());
        }

        Event::JobStatusChanged { job_id, status, at_ms } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = *status;
                match status {
                    bq_core::JobStatus::Launching if job.started_at.is_none() => {
                        job.started_at = Some(*at_ms);
                    }
                    bq_core::JobStatus::Completed
                    | bq_core::JobStatus::Failed
                    | bq_core::JobStatus::Cancelled
                    | bq_core::JobStatus::Lost => {
                        if job.finished_at.is_none() {
                            job.finished_at = Some(*at_ms);
                        }
                    }
                    _ => {}
                }
            }
        }

        Event::JobPidCaptured { job_id, pid } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.remote_pid = Some(*pid);
            }
        }

        Event::JobOutputsCaptured { job_id, stdout, stderr, result_artifact, exit_status } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                if stdout.is_some() {
                    job.stdout = stdout.clone();
                }
                if stderr.is_some() {
                    job.stderr = stderr.clone();
                }
                if result_artifact.is_some() {
                    job.result_artifact = result_artifact.clone();
                }
                if exit_status.is_some() {
                    job.exit_status = *exit_status;
                }
            }
        }

        Event::JobCancellationRequested { job_id } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.cancellation_requested = true;
            }
        }

        Event::JobArtifactsPurged { job_id } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.stdout = None;
                job.stderr = None;
                job.result_artifact = None;
            }
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
