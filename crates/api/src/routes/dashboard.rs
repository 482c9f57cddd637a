// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /dashboard` (§6.3): one snapshot combining job counts, per-node
//! queue descriptors, active jobs, recent terminal jobs, and health
//! aggregates.

use crate::auth::AuthContext;
use crate::dto::{ActiveJobEntry, DashboardResponse, HealthAggregates, JobSummary, NodeQueueDescriptor};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use bq_core::{Clock, JobStatus};

const RECENT_TERMINAL_LIMIT: usize = 20;
/// Window size for the success-ratio aggregate (§6.3: "over last W
/// terminal jobs").
const SUCCESS_RATIO_WINDOW: usize = 50;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

pub async fn dashboard<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    auth: AuthContext,
) -> Json<DashboardResponse> {
    let principal_filter = if auth.is_admin { None } else { Some(auth.principal.as_str()) };
    let now_ms = state.clock.epoch_ms();

    let job_counts = state.store.job_counts(principal_filter);
    let all_nodes = state.store.all_nodes();

    let nodes: Vec<NodeQueueDescriptor> = all_nodes
        .iter()
        .map(|n| {
            let current_job = n.current_job.and_then(|id| state.store.read_job(id).ok()).as_ref().map(JobSummary::from_job);
            NodeQueueDescriptor {
                index: n.index.0,
                queue_size: state.store.queue_size_for_node(n.index),
                projected_queue_secs: n.projected_queue_secs,
                busy: n.is_busy(),
                current_job,
            }
        })
        .collect();

    let active_jobs: Vec<ActiveJobEntry> = state
        .store
        .list_active_jobs()
        .into_iter()
        .filter(|j| !principal_filter.is_some_and(|p| j.owner != p))
        .map(|j| ActiveJobEntry {
            queue_position: state.store.queue_position(j.id),
            job_id: j.id,
            owner: j.owner,
            status: j.status,
            node: j.node.0,
        })
        .collect();

    let recent_terminal: Vec<JobSummary> = state
        .store
        .recent_terminal_jobs(principal_filter, RECENT_TERMINAL_LIMIT)
        .iter()
        .map(JobSummary::from_job)
        .collect();

    let success_sample = state.store.recent_terminal_jobs(principal_filter, SUCCESS_RATIO_WINDOW);
    let success_ratio = if success_sample.is_empty() {
        1.0
    } else {
        success_sample.iter().filter(|j| j.status == JobStatus::Completed).count() as f64 / success_sample.len() as f64
    };

    let node_utilization_percent = if all_nodes.is_empty() {
        0.0
    } else {
        all_nodes.iter().filter(|n| n.is_busy()).count() as f64 / all_nodes.len() as f64 * 100.0
    };
    let average_projected_queue_secs = if all_nodes.is_empty() {
        0.0
    } else {
        all_nodes.iter().map(|n| n.projected_queue_secs).sum::<u64>() as f64 / all_nodes.len() as f64
    };
    let submissions_last_24h = state.store.count_jobs_created_since(principal_filter, now_ms.saturating_sub(DAY_MS));

    Json(DashboardResponse {
        job_counts,
        nodes,
        active_jobs,
        recent_terminal,
        health: HealthAggregates {
            node_utilization_percent,
            average_projected_queue_secs,
            success_ratio,
            submissions_last_24h,
        },
    })
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
