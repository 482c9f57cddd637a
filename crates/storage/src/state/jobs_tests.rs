// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::{Job, JobStatus};

fn job_admitted(job: Job) -> Event {
    Event::JobAdmitted { job: Box::new(job) }
}

#[test]
fn admitting_twice_keeps_first_row() {
    let mut state = MaterializedState::default();
    let job = Job::builder().owner("alice").build();
    let id = job.id;
    let event = job_admitted(job.clone());
    apply(&mut state, &event);
    apply(&mut state, &event);
    assert_eq!(state.jobs.len(), 1);
    assert_eq!(state.jobs[&id].owner, "alice");
}

#[test]
fn status_change_sets_started_at_on_launching() {
    let mut state = MaterializedState::default();
    let job = Job::builder().status(JobStatus::Queued).build();
    let id = job.id;
    apply(&mut state, &job_admitted(job));
    apply(&mut state, &Event::JobStatusChanged { job_id: id, status: JobStatus::Launching, at_ms: 42 });
    assert_eq!(state.jobs[&id].status, JobStatus::Launching);
    assert_eq!(state.jobs[&id].started_at, Some(42));
}

#[test]
fn status_change_to_terminal_sets_finished_at_once() {
    let mut state = MaterializedState::default();
    let job = Job::builder().status(JobStatus::Retrieving).build();
    let id = job.id;
    apply(&mut state, &job_admitted(job));
    apply(&mut state, &Event::JobStatusChanged { job_id: id, status: JobStatus::Completed, at_ms: 100 });
    apply(&mut state, &Event::JobStatusChanged { job_id: id, status: JobStatus::Completed, at_ms: 200 });
    assert_eq!(state.jobs[&id].finished_at, Some(100));
}

#[test]
fn pid_capture_sets_remote_pid() {
    let mut state = MaterializedState::default();
    let job = Job::builder().build();
    let id = job.id;
    apply(&mut state, &job_admitted(job));
    apply(&mut state, &Event::JobPidCaptured { job_id: id, pid: 4242 });
    assert_eq!(state.jobs[&id].remote_pid, Some(4242));
}

#[test]
fn outputs_captured_only_overwrites_present_fields() {
    let mut state = MaterializedState::default();
    let job = Job::builder().stdout("partial").build();
    let id = job.id;
    apply(&mut state, &job_admitted(job));
    apply(&mut state, &Event::JobOutputsCaptured {
        job_id: id,
        stdout: None,
        stderr: Some("oops".to_string()),
        result_artifact: None,
        exit_status: None,
    });
    assert_eq!(state.jobs[&id].stdout.as_deref(), Some("partial"));
    assert_eq!(state.jobs[&id].stderr.as_deref(), Some("oops"));
}

#[test]
fn cancellation_requested_sets_flag() {
    let mut state = MaterializedState::default();
    let job = Job::builder().build();
    let id = job.id;
    apply(&mut state, &job_admitted(job));
    assert!(!state.jobs[&id].cancellation_requested);
    apply(&mut state, &Event::JobCancellationRequested { job_id: id });
    assert!(state.jobs[&id].cancellation_requested);
}
