// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node-record event handlers. Only the Placer (via
//! `NodeProjectedQueueDelta`) and the Worker (via the other two
//! variants) ever emit these — see §9's ownership note.

use bq_core::{Event, NodeRecord};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::NodeProjectedQueueDelta { node, delta_secs } => {
            let record = state
                .nodes
                .entry(*node)
                .or_insert_with(|| NodeRecord::new(*node, format!("node-{}", node.0)));
            if *delta_secs >= 0 {
                record.add_projected(*delta_secs as u32);
            } else {
                record.subtract_projected((-delta_secs) as u32);
            }
        }

        Event::NodeReachabilityChanged { node, reachable, quarantined } => {
            let record = state
                .nodes
                .entry(*node)
                .or_insert_with(|| NodeRecord::new(*node, format!("node-{}", node.0)));
            record.reachable = *reachable;
            record.quarantined = *quarantined;
        }

        Event::NodeCurrentJobSet { node, job_id } => {
            let record = state
                .nodes
                .entry(*node)
                .or_insert_with(|| NodeRecord::new(*node, format!("node-{}", node.0)));
            record.current_job = *job_id;
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "nodes_tests.rs"]
mod tests;
