// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker loop (C7, §4.7): one per node, draining that node's FIFO
//! queue one job at a time and driving it through launch, supervision,
//! and retrieval.

use crate::config::WorkerConfig;
use crate::supervisor::{supervise, Outcome};
use bq_core::{Clock, ExitStatus, Job, JobStatus};
use bq_storage::Store;
use bq_transport::Transport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Worker<T, C> {
    store: Arc<Store>,
    transport: T,
    config: WorkerConfig,
    clock: C,
}

impl<T, C> Worker<T, C>
where
    T: Transport + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<Store>, transport: T, config: WorkerConfig, clock: C) -> Self {
        Self { store, transport, config, clock }
    }

    /// Run until `shutdown` fires. §4.7's worker loop: ensure
    /// connectivity, claim, launch, supervise, retrieve, release — one
    /// job at a time, forever.
    pub async fn run(&self, shutdown: CancellationToken) {
        self.recover_in_flight().await;

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            if !self.transport.is_channel_alive().await {
                if let Err(e) = self.transport.connect().await {
                    warn!(node = %self.config.node, error = %e, "worker could not reach its node, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
                        _ = shutdown.cancelled() => return,
                    }
                    continue;
                }
            }

            match self.store.claim_next_for_node(self.config.node, self.clock.epoch_ms()) {
                Ok(Some(job)) => self.run_job(job).await,
                Ok(None) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
                        _ = shutdown.cancelled() => return,
                    }
                }
                Err(e) => {
                    error!(node = %self.config.node, error = %e, "failed to claim next job");
                    tokio::time::sleep(self.config.idle_poll_interval).await;
                }
            }
        }
    }

    /// §4.7 crash recovery: jobs left in-flight for this node when the
    /// worker last stopped. A surviving pid resumes supervision from
    /// wherever it was; no pid means the launch itself never completed
    /// and the job is unrecoverable.
    async fn recover_in_flight(&self) {
        for job in self.store.in_flight_jobs_for_node(self.config.node) {
            info!(job_id = %job.id, status = %job.status, "reconciling in-flight job at startup");
            match job.remote_pid {
                Some(pid) => {
                    if !matches!(job.status, JobStatus::Running | JobStatus::Retrieving) {
                        // launching without a pid never reaches this branch
                        // (remote_pid_invariant_holds), but launching *with*
                        // a pid captured just before a crash resumes as running.
                        let _ = self.store.set_job_status(job.id, JobStatus::Running, self.clock.epoch_ms());
                    }
                    self.supervise_and_finish(job, pid).await;
                }
                None => {
                    warn!(job_id = %job.id, "no pid recorded for in-flight job, marking lost");
                    self.finish_job(&job, JobStatus::Lost, None, None, None, None).await;
                }
            }
        }
    }

    async fn run_job(&self, job: Job) {
        info!(job_id = %job.id, node = %self.config.node, "launching job");
        let workdir = self.config.remote_workdir(job.id);

        if self.config.restart_remote_workspace {
            if let Err(e) = self
                .transport
                .exec(&self.config.workspace_reset_command, self.config.control_exec_timeout)
                .await
            {
                warn!(job_id = %job.id, error = %e, "workspace reset failed, continuing anyway");
            }
        }

        match self.launch_with_retries(&job, &workdir).await {
            Ok(pid) => {
                // Upload succeeded; the staged local copy (§9 "uploaded
                // source retention") is no longer needed.
                let _ = std::fs::remove_file(&job.code_pointer);
                if let Err(e) = self.store.set_job_pid(job.id, pid) {
                    error!(job_id = %job.id, error = %e, "failed to persist pid");
                }
                if let Err(e) = self.store.set_job_status(job.id, JobStatus::Running, self.clock.epoch_ms()) {
                    error!(job_id = %job.id, error = %e, "failed to persist running status");
                }
                self.supervise_and_finish(job, pid).await;
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "pre-launch failure, retries exhausted");
                self.finish_job(&job, JobStatus::Failed, None, None, None, Some(ExitStatus::Unknown)).await;
            }
        }
    }

    /// Upload the artifact and launch the detached command, retrying a
    /// bounded number of times on transport failure (§4.7 step 4-5).
    async fn launch_with_retries(&self, job: &Job, workdir: &str) -> Result<u64, bq_transport::TransportError> {
        let artifact_bytes = std::fs::read(&job.code_pointer).map_err(bq_transport::TransportError::from)?;
        let artifact_path = format!("{workdir}/artifact");
        let mut attempt = 0;
        loop {
            let result = self.launch_once(&artifact_bytes, workdir, &artifact_path).await;
            match result {
                Ok(pid) => return Ok(pid),
                Err(e) if attempt + 1 >= self.config.launch_retry_attempts => return Err(e),
                Err(e) => {
                    warn!(job_id = %job.id, attempt, error = %e, "launch attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.config.launch_retry_delay).await;
                }
            }
        }
    }

    async fn launch_once(
        &self,
        artifact_bytes: &[u8],
        workdir: &str,
        artifact_path: &str,
    ) -> Result<u64, bq_transport::TransportError> {
        self.transport.put_file(artifact_bytes, artifact_path).await?;

        let inner = self.config.launch_command(artifact_path);
        let detached = format!(
            "mkdir -p {workdir} && cd {workdir} && nohup sh -c '({inner}) >stdout.log 2>stderr.log; echo $? >exit_code' </dev/null >/dev/null 2>&1 & echo $!"
        );
        let out = self.transport.exec(&detached, self.config.control_exec_timeout).await?;
        out.stdout
            .trim()
            .parse::<u64>()
            .map_err(|_| bq_transport::TransportError::Io(format!("launch did not yield a pid: {:?}", out.stdout)))
    }

    async fn supervise_and_finish(&self, job: Job, pid: u64) {
        let outcome = supervise(&self.transport, &self.store, &self.config, &self.clock, &job, pid).await;
        match outcome {
            Outcome::Lost => {
                self.finish_job(&job, JobStatus::Lost, None, None, None, None).await;
            }
            Outcome::Exited { cancelled } => {
                if let Err(e) = self.store.set_job_status(job.id, JobStatus::Retrieving, self.clock.epoch_ms()) {
                    error!(job_id = %job.id, error = %e, "failed to persist retrieving status");
                }
                let workdir = self.config.remote_workdir(job.id);
                let (stdout, stderr, exit_status) = self.retrieve_outputs(&workdir).await;
                let result_artifact = self.try_read_result(&workdir).await;

                let final_status = if cancelled {
                    JobStatus::Cancelled
                } else if exit_status.map(|e| e.is_success()).unwrap_or(false) {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                };

                self.finish_job(&job, final_status, stdout, stderr, result_artifact, exit_status).await;
            }
        }
    }

    /// §4.7 step 7: read stdout/stderr and the exit-code marker the
    /// launch command wrote. A missing exit-code file (pid vanished
    /// without the wrapper ever completing) maps to `Unknown`.
    async fn retrieve_outputs(&self, workdir: &str) -> (Option<String>, Option<String>, Option<ExitStatus>) {
        let stdout = self.read_text_best_effort(&format!("{workdir}/stdout.log")).await;
        let stderr = self.read_text_best_effort(&format!("{workdir}/stderr.log")).await;
        let exit_status = match self.read_text_best_effort(&format!("{workdir}/exit_code")).await {
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(code) => Some(ExitStatus::Normal { code }),
                Err(_) => Some(ExitStatus::Unknown),
            },
            None => Some(ExitStatus::Unknown),
        };
        (stdout, stderr, exit_status)
    }

    async fn try_read_result(&self, workdir: &str) -> Option<String> {
        self.read_text_best_effort(&format!("{workdir}/result.json")).await
    }

    async fn read_text_best_effort(&self, path: &str) -> Option<String> {
        match self.transport.read_file(path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!(path, error = %e, "could not retrieve remote file");
                None
            }
        }
    }

    async fn finish_job(
        &self,
        job: &Job,
        status: JobStatus,
        stdout: Option<String>,
        stderr: Option<String>,
        result_artifact: Option<String>,
        exit_status: Option<ExitStatus>,
    ) {
        if stdout.is_some() || stderr.is_some() || result_artifact.is_some() || exit_status.is_some() {
            if let Err(e) = self.store.record_job_outputs(job.id, stdout, stderr, result_artifact, exit_status) {
                error!(job_id = %job.id, error = %e, "failed to persist job outputs");
            }
        }
        if let Err(e) = self.store.set_job_status(job.id, status, self.clock.epoch_ms()) {
            error!(job_id = %job.id, error = %e, "failed to persist terminal status");
        }
        if let Err(e) = self.store.release_node_slot(self.config.node, job.declared_budget_secs) {
            error!(job_id = %job.id, error = %e, "failed to release node slot");
        }
        info!(job_id = %job.id, status = %status, "job reached terminal status");
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
