// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background result-retention sweep (SPEC_FULL.md §5/§9): terminal
//! jobs older than `result_retention_hours` have their captured
//! stdout/stderr/result artifact cleared. The job row itself is never
//! deleted here — only the artifact payload.

use std::sync::Arc;
use std::time::Duration;

use bq_core::Clock;
use bq_storage::Store;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How often the sweep wakes up to look for purge candidates.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Run the sweep until `shutdown` is cancelled.
pub async fn run<C: Clock>(store: Arc<Store>, clock: C, retention: Duration, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
        }

        let cutoff_ms = clock.epoch_ms().saturating_sub(retention.as_millis() as u64);
        let candidates = store.terminal_jobs_with_artifacts_before(cutoff_ms);
        if candidates.is_empty() {
            continue;
        }

        let mut purged = 0u32;
        for job in candidates {
            match store.purge_job_artifacts(job.id) {
                Ok(()) => purged += 1,
                Err(e) => warn!(job_id = %job.id, error = %e, "failed to purge job artifacts"),
            }
        }
        info!(purged, "result-retention sweep purged job artifacts");
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
