// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervision (C8, §4.7): once a job is running, poll its pid,
//! honor cancellation, enforce the advisory wall-clock budget, and
//! decide when a node has gone dark long enough to give the job up as
//! `lost` rather than `failed`.

use crate::config::WorkerConfig;
use bq_core::{Clock, Job};
use bq_storage::Store;
use bq_transport::Transport;
use tracing::{info, warn};

pub enum Outcome {
    /// The remote pid is gone — either it exited on its own or the
    /// supervisor killed it. `cancelled` distinguishes the latter so
    /// the caller can route to `cancelled` instead of reading exit
    /// status as the final word.
    Exited { cancelled: bool },
    /// The node could not be reached again within the reconnect
    /// budget and the pid can no longer be observed either way.
    Lost,
}

/// Poll until the pid disappears, cancellation is observed, the
/// wall-clock budget expires, or the reconnect budget is exhausted.
pub async fn supervise<T, C>(
    transport: &T,
    store: &Store,
    config: &WorkerConfig,
    clock: &C,
    job: &Job,
    pid: u64,
) -> Outcome
where
    T: Transport,
    C: Clock,
{
    let deadline_ms = job.started_at.unwrap_or(clock.epoch_ms())
        + config.wall_clock_deadline_secs(job.declared_budget_secs) * 1000;
    let mut reconnect_failures = 0u32;
    let mut killed = false;

    loop {
        tokio::time::sleep(config.supervision_poll_interval).await;

        if !killed {
            let current = store.read_job(job.id);
            let cancellation_requested = matches!(&current, Ok(j) if j.cancellation_requested);
            let timed_out = clock.epoch_ms() >= deadline_ms;
            if cancellation_requested || timed_out {
                if timed_out && !cancellation_requested {
                    warn!(job_id = %job.id, "wall-clock budget exceeded, issuing kill");
                }
                if let Err(e) = transport.kill_pid(pid).await {
                    warn!(job_id = %job.id, error = %e, "kill_pid failed, will keep polling");
                } else {
                    killed = true;
                }
            }
        }

        match transport.is_alive_pid(pid).await {
            Ok(true) => continue,
            Ok(false) => return Outcome::Exited { cancelled: killed },
            Err(e) => {
                reconnect_failures += 1;
                warn!(job_id = %job.id, error = %e, reconnect_failures, "lost contact with node during supervision");
                if reconnect_failures > config.max_supervision_reconnect_failures {
                    info!(job_id = %job.id, "reconnect budget exhausted, marking job lost");
                    return Outcome::Lost;
                }
                let _ = transport.connect().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
