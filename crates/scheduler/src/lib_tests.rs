// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::{Job, JobStatus, NodeRecord};
use proptest::prelude::*;

fn idx(i: u32) -> NodeIndex {
    NodeIndex(i)
}

fn node(i: u32, load: u64) -> NodeRecord {
    let mut n = NodeRecord::new(idx(i), format!("node-{i}"));
    n.projected_queue_secs = load;
    n
}

#[test]
fn chooses_minimum_load() {
    let all = vec![idx(0), idx(1), idx(2)];
    let nodes = vec![node(0, 10), node(1, 3), node(2, 7)];
    assert_eq!(place(&all, &nodes), idx(1));
}

#[test]
fn ties_break_to_lowest_index() {
    let all = vec![idx(0), idx(1), idx(2)];
    let nodes = vec![node(0, 5), node(1, 5), node(2, 5)];
    assert_eq!(place(&all, &nodes), idx(0));
}

#[test]
fn missing_node_record_treated_as_zero_load() {
    let all = vec![idx(0), idx(1)];
    let nodes = vec![node(0, 100)];
    assert_eq!(place(&all, &nodes), idx(1));
}

proptest! {
    #[test]
    fn placement_is_deterministic_given_same_inputs(
        loads in proptest::collection::vec(0u64..1000, 1..8),
    ) {
        let all: Vec<NodeIndex> = (0..loads.len() as u32).map(idx).collect();
        let nodes: Vec<NodeRecord> = loads.iter().enumerate().map(|(i, &l)| node(i as u32, l)).collect();
        let first = place(&all, &nodes);
        let second = place(&all, &nodes);
        prop_assert_eq!(first, second);

        let min = *loads.iter().min().unwrap();
        let expected_idx = loads.iter().position(|&l| l == min).unwrap() as u32;
        prop_assert_eq!(first, idx(expected_idx));
    }
}

#[test]
fn cancel_eligible_for_active_states() {
    for status in [JobStatus::Queued, JobStatus::Launching, JobStatus::Running] {
        let job = Job::builder().status(status).build();
        assert!(check_cancel_eligible(&job).is_ok());
    }
}

#[test]
fn cancel_rejected_for_terminal_and_retrieving_states() {
    for status in [
        JobStatus::Retrieving,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
        JobStatus::Lost,
        JobStatus::Admitted,
    ] {
        let job = Job::builder().status(status).build();
        let err = check_cancel_eligible(&job).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TerminalState);
    }
}
