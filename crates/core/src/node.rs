// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-node record (§3): projected queue time, current job, reachability.

use crate::job::JobId;

/// Index into the fixed pool of `num_nodes` compute nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record per node index i∈[0,N) (§3). Owned by the Store for
/// durability; the Placer is the only component that mutates
/// `projected_queue_secs` (§9's "Global mutable state → explicit
/// ownership" note).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord {
    pub index: NodeIndex,
    pub projected_queue_secs: u64,
    pub current_job: Option<JobId>,
    pub reachable: bool,
    pub quarantined: bool,
    pub address_tag: String,
}

impl NodeRecord {
    pub fn new(index: NodeIndex, address_tag: impl Into<String>) -> Self {
        Self {
            index,
            projected_queue_secs: 0,
            current_job: None,
            reachable: true,
            quarantined: false,
            address_tag: address_tag.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current_job.is_some()
    }

    /// Add a job's declared budget to the projection. Called by the
    /// Placer as part of the same atomic step as the job insert (§4.5).
    pub fn add_projected(&mut self, secs: u32) {
        self.projected_queue_secs = self.projected_queue_secs.saturating_add(secs as u64);
    }

    /// Subtract a job's declared budget, floored at zero (§4.7 step 8).
    pub fn subtract_projected(&mut self, secs: u32) {
        self.projected_queue_secs = self.projected_queue_secs.saturating_sub(secs as u64);
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
