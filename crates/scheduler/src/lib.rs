// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placer (C5, §4.5) and per-node FIFO queue eligibility (C6, §4.6).
//!
//! Like `bq-quota`, this crate is pure decision logic with no I/O and
//! no lock of its own. `bq-storage::Store` calls [`place`] inside the
//! same critical section as the job insert so the "update the
//! projected queue time atomically with the insert" requirement of
//! §4.5 holds, and calls [`check_cancel_eligible`] before committing a
//! cancellation.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use bq_core::{ErrorKind, Job, NodeIndex, NodeRecord, TaxonomyError};

/// §4.5: choose the node with the smallest projected queue time,
/// breaking ties by lowest index. `nodes` need not be sorted or
/// exhaustive over `[0, N)`; a node absent from `nodes` (never having
/// had a job) is treated as having zero projected load.
///
/// `all_node_indices` is the full fixed pool `[0, N)`; nodes not yet
/// present in the store's node table are synthesized with zero load so
/// a freshly started server with an empty node table still places
/// correctly on node 0 first.
pub fn place(all_node_indices: &[NodeIndex], nodes: &[NodeRecord]) -> NodeIndex {
    debug_assert!(!all_node_indices.is_empty(), "placer called with an empty node pool");
    let load_of = |idx: NodeIndex| -> u64 {
        nodes.iter().find(|n| n.index == idx).map(|n| n.projected_queue_secs).unwrap_or(0)
    };
    let mut best = all_node_indices[0];
    let mut best_load = load_of(best);
    for &idx in &all_node_indices[1..] {
        let load = load_of(idx);
        if load < best_load || (load == best_load && idx < best) {
            best = idx;
            best_load = load;
        }
    }
    best
}

/// §4.6: a cancel succeeds iff the job is in a cancellable state.
/// Ownership is enforced by the caller uniformly across every
/// ownership-gated endpoint (`bq-api`'s `authorize_job`, per
/// SPEC_FULL.md §5's open-question-1 resolution) rather than here, so
/// this only covers the state-machine half of §4.6's contract.
pub fn check_cancel_eligible(job: &Job) -> Result<(), TaxonomyError> {
    if !job.status.is_cancellable() {
        return Err(TaxonomyError::new(
            ErrorKind::TerminalState,
            format!("job is in terminal-adjacent state {}", job.status),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
