// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay (§6.5's "three logical
//! tables": jobs, node-state, credentials, plus the rate-window table
//! §4.4 needs).

mod credentials;
mod helpers;
mod jobs;
mod nodes;

use bq_core::{CredentialId, Event, Job, JobId, JobStatus, NodeIndex, NodeRecord, Principal, RateWindow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived state from replaying the event log. All fields are keyed for
/// O(1) lookup by id; the (principal,status) and (node,status) index
/// requirements from §6.5 are served by [`MaterializedState::jobs_for_principal`]
/// and [`MaterializedState::jobs_for_node`] scanning `jobs` — acceptable
/// for the single-process, in-memory scale this store targets; a real
/// secondary index would trade memory for scan time neither multi-tenant
/// dispatcher workload needs yet.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<JobId, Job>,
    pub nodes: HashMap<NodeIndex, NodeRecord>,
    pub credentials: HashMap<CredentialId, bq_core::Credential>,
    /// secret_hash → credential id, for `lookup-credential-by-hash` (§4.1).
    #[serde(default)]
    pub credential_by_hash: HashMap<String, CredentialId>,
    #[serde(default)]
    pub rate_windows: HashMap<Principal, RateWindow>,
}

impl MaterializedState {
    pub fn get_job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Look up a job by a unique id prefix, for hand-typed short ids.
    pub fn get_job_by_prefix(&self, prefix: &str) -> Option<&Job> {
        helpers::find_job_by_prefix(&self.jobs, prefix)
    }

    /// §4.1 query-jobs by principal.
    pub fn jobs_for_principal(&self, principal: &str) -> Vec<&Job> {
        let mut v: Vec<&Job> = self.jobs.values().filter(|j| j.owner == principal).collect();
        v.sort_by_key(|j| j.created_at);
        v
    }

    /// §4.1 list-active-jobs: "jobs whose status is {queued, launching,
    /// running, retrieving}" — the reconciliation query workers rely on.
    pub fn active_jobs(&self) -> Vec<&Job> {
        self.jobs.values().filter(|j| j.status.is_active()).collect()
    }

    /// §4.6 per-node FIFO ready view: queued jobs for node `node`, oldest first.
    pub fn queued_for_node(&self, node: NodeIndex) -> Vec<&Job> {
        let mut v: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| j.node == node && j.status == JobStatus::Queued)
            .collect();
        v.sort_by_key(|j| j.created_at);
        v
    }

    pub fn credential_by_hash(&self, hash: &str) -> Option<&bq_core::Credential> {
        self.credential_by_hash.get(hash).and_then(|id| self.credentials.get(id))
    }

    /// Apply an event to derive state changes.
    ///
    /// All handlers MUST be idempotent — the same event may be applied
    /// once for immediate visibility and again during WAL replay.
    /// Guidelines: assign rather than mutate deltas twice, guard inserts
    /// with existence checks, and guard status-dependent side effects
    /// (like queue-time deltas) behind the transition they accompany.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobAdmitted { .. }
            | Event::JobStatusChanged { .. }
            | Event::JobPidCaptured { .. }
            | Event::JobOutputsCaptured { .. }
            | Event::JobCancellationRequested { .. }
            | Event::JobArtifactsPurged { .. } => jobs::apply(self, event),

            Event::NodeProjectedQueueDelta { .. }
            | Event::NodeReachabilityChanged { .. }
            | Event::NodeCurrentJobSet { .. } => nodes::apply(self, event),

            Event::CredentialCreated { .. } | Event::CredentialsDeactivatedForPrincipal { .. } => {
                credentials::apply(self, event)
            }

            Event::RateSubmissionRecorded { principal, at_ms } => {
                self.rate_windows.entry(principal.clone()).or_default().record(*at_ms);
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
