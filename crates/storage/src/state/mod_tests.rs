// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::{Job, JobStatus, NodeIndex};

#[test]
fn active_jobs_filters_by_status() {
    let mut state = MaterializedState::default();
    let queued = Job::builder().status(JobStatus::Queued).build();
    let completed = Job::builder().status(JobStatus::Completed).build();
    state.jobs.insert(queued.id, queued.clone());
    state.jobs.insert(completed.id, completed);
    let active = state.active_jobs();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, queued.id);
}

#[test]
fn queued_for_node_is_fifo_by_created_at() {
    let mut state = MaterializedState::default();
    let first = Job::builder().status(JobStatus::Queued).node(NodeIndex(0)).created_at(1u64).build();
    let second = Job::builder().status(JobStatus::Queued).node(NodeIndex(0)).created_at(2u64).build();
    let other_node = Job::builder().status(JobStatus::Queued).node(NodeIndex(1)).created_at(0u64).build();
    state.jobs.insert(second.id, second.clone());
    state.jobs.insert(first.id, first.clone());
    state.jobs.insert(other_node.id, other_node);
    let ready = state.queued_for_node(NodeIndex(0));
    assert_eq!(ready.iter().map(|j| j.id).collect::<Vec<_>>(), vec![first.id, second.id]);
}

#[test]
fn jobs_for_principal_excludes_other_owners() {
    let mut state = MaterializedState::default();
    let mine = Job::builder().owner("alice").build();
    let theirs = Job::builder().owner("bob").build();
    state.jobs.insert(mine.id, mine.clone());
    state.jobs.insert(theirs.id, theirs);
    let rows = state.jobs_for_principal("alice");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, mine.id);
}

#[test]
fn get_job_by_prefix_requires_unique_match() {
    let mut state = MaterializedState::default();
    let job = Job::builder().build();
    state.jobs.insert(job.id, job.clone());
    let prefix = &job.id.as_str()[..8];
    assert_eq!(state.get_job_by_prefix(prefix).map(|j| j.id), Some(job.id));
}

#[test]
fn apply_event_dispatches_rate_submission_without_panicking() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::RateSubmissionRecorded { principal: "alice".to_string(), at_ms: 10 });
    assert_eq!(state.rate_windows.get("alice").map(|w| w.len()), Some(1));
}
