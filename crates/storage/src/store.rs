// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Store (C1, §4.1): durable record of jobs, node state, credentials,
//! and rate counters, with single-writer semantics and concurrent
//! readers.
//!
//! Writes go through the WAL first (durability point), then are applied
//! to the in-memory `MaterializedState` under one lock, so "single
//! writer, concurrent readers" is realized as "exclusive write critical
//! section, shared read snapshot clone" rather than a real multi-reader
//! lock — acceptable because reads here are cheap clones of small rows,
//! not long-held borrows that would starve a writer.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use bq_core::{Credential, Event, Job, JobId, JobStatus, NodeIndex, NodeRecord, Principal};
use bq_quota::QuotaError;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("lock held by another process at {0}")]
    Locked(PathBuf),
}

/// Not found is distinct from a storage error per §4.1's "Reads that
/// cannot find an id return not-found (distinct from a storage error)".
pub enum ReadError {
    NotFound,
    Storage(StoreError),
}

impl From<StoreError> for ReadError {
    fn from(e: StoreError) -> Self {
        ReadError::Storage(e)
    }
}

/// Durable event-sourced store. One instance per process — §1's
/// non-goal of horizontal scaling means there is exactly one writer by
/// construction, enforced additionally by an advisory file lock so a
/// second `bqd` process started by mistake fails fast instead of
/// corrupting the WAL.
pub struct Store {
    inner: Mutex<Inner>,
    _lock_file: File,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    snapshot_path: PathBuf,
}

const SNAPSHOT_EVERY: u64 = 500;

impl Store {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(state_dir).map_err(WalError::Io)?;
        let lock_path = state_dir.join("bq.lock");
        let lock_file = File::create(&lock_path).map_err(WalError::Io)?;
        lock_file.try_lock_exclusive().map_err(|_| StoreError::Locked(lock_path))?;

        let snapshot_path = state_dir.join("snapshot.json");
        let wal_path = state_dir.join("wal.jsonl");

        let snapshot = Snapshot::load(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self {
            inner: Mutex::new(Inner { wal, state, snapshot_path }),
            _lock_file: lock_file,
        })
    }

    fn commit(&self, inner: &mut Inner, event: Event) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        if seq % SNAPSHOT_EVERY == 0 {
            let snapshot = Snapshot::new(seq, inner.state.clone());
            snapshot.save(&inner.snapshot_path)?;
            inner.wal.truncate_before(seq)?;
        }
        Ok(())
    }

    // -- jobs -----------------------------------------------------------

    pub fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobAdmitted { job: Box::new(job) })
    }

    pub fn read_job(&self, id: JobId) -> Result<Job, ReadError> {
        let inner = self.inner.lock();
        inner.state.get_job(&id).cloned().ok_or(ReadError::NotFound)
    }

    /// Resolve a hand-typed id, falling back to a unique-prefix match
    /// (`MaterializedState::get_job_by_prefix`) when no job has that
    /// exact id — the wire-layer counterpart of the CLI convenience
    /// already grounded in `storage::state::helpers`.
    pub fn resolve_job(&self, id_str: &str) -> Result<Job, ReadError> {
        let inner = self.inner.lock();
        let exact = JobId::from_string(id_str);
        if let Some(job) = inner.state.get_job(&exact) {
            return Ok(job.clone());
        }
        inner.state.get_job_by_prefix(id_str).cloned().ok_or(ReadError::NotFound)
    }

    /// §6.1 status response's `queue-position`: this job's 0-based
    /// position in its node's FIFO ready view, or `None` if it is not
    /// currently queued.
    pub fn queue_position(&self, id: JobId) -> Option<usize> {
        let inner = self.inner.lock();
        let job = inner.state.get_job(&id)?;
        if job.status != JobStatus::Queued {
            return None;
        }
        inner.state.queued_for_node(job.node).iter().position(|j| j.id == id)
    }

    pub fn queue_size_for_node(&self, node: NodeIndex) -> usize {
        self.inner.lock().state.queued_for_node(node).len()
    }

    /// §6.3 dashboard job counts, grouped by status and optionally
    /// filtered to one principal (self-filtered view for non-admins).
    pub fn job_counts(&self, principal: Option<&str>) -> std::collections::HashMap<JobStatus, usize> {
        let inner = self.inner.lock();
        let mut counts = std::collections::HashMap::new();
        for job in inner.state.jobs.values() {
            if principal.is_some_and(|p| job.owner != p) {
                continue;
            }
            *counts.entry(job.status).or_insert(0usize) += 1;
        }
        counts
    }

    /// §6.3 "last K recent terminal jobs", newest-finished first.
    pub fn recent_terminal_jobs(&self, principal: Option<&str>, limit: usize) -> Vec<Job> {
        let inner = self.inner.lock();
        let mut rows: Vec<Job> = inner
            .state
            .jobs
            .values()
            .filter(|j| j.status.is_terminal() && !principal.is_some_and(|p| j.owner != p))
            .cloned()
            .collect();
        rows.sort_by_key(|j| std::cmp::Reverse(j.finished_at.unwrap_or(0)));
        rows.truncate(limit);
        rows
    }

    /// §6.3 "submissions in last 24h" health aggregate.
    pub fn count_jobs_created_since(&self, principal: Option<&str>, since_ms: u64) -> usize {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .filter(|j| j.created_at >= since_ms && !principal.is_some_and(|p| j.owner != p))
            .count()
    }

    pub fn query_jobs(&self, principal: Option<&str>, status: Option<JobStatus>, limit: usize) -> Vec<Job> {
        let inner = self.inner.lock();
        let mut rows: Vec<Job> = match principal {
            Some(p) => inner.state.jobs_for_principal(p).into_iter().cloned().collect(),
            None => inner.state.jobs.values().cloned().collect(),
        };
        if let Some(status) = status {
            rows.retain(|j| j.status == status);
        }
        rows.sort_by_key(|j| j.created_at);
        rows.truncate(limit.max(1));
        rows
    }

    pub fn list_active_jobs(&self) -> Vec<Job> {
        let inner = self.inner.lock();
        inner.state.active_jobs().into_iter().cloned().collect()
    }

    /// Atomic claim: the caller's placer/worker logic decides which job
    /// to pick; this applies the resulting transition as one commit.
    pub fn set_job_status(&self, id: JobId, status: JobStatus, at_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobStatusChanged { job_id: id, status, at_ms })
    }

    pub fn set_job_pid(&self, id: JobId, pid: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobPidCaptured { job_id: id, pid })
    }

    pub fn set_job_cancellation_requested(&self, id: JobId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobCancellationRequested { job_id: id })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_job_outputs(
        &self,
        id: JobId,
        stdout: Option<String>,
        stderr: Option<String>,
        result_artifact: Option<String>,
        exit_status: Option<bq_core::ExitStatus>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            Event::JobOutputsCaptured { job_id: id, stdout, stderr, result_artifact, exit_status },
        )
    }

    /// §4.7 worker loop step 2: atomically claim the oldest queued job
    /// for `node` (queued → launching, `started_at` set, current-job
    /// pointer set). Returns `None` if the node's queue is empty — the
    /// caller sleeps briefly and retries.
    pub fn claim_next_for_node(&self, node: NodeIndex, at_ms: u64) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock();
        let next = inner.state.queued_for_node(node).first().map(|j| j.id);
        let Some(job_id) = next else { return Ok(None) };

        self.commit(&mut inner, Event::JobStatusChanged { job_id, status: JobStatus::Launching, at_ms })?;
        self.commit(&mut inner, Event::NodeCurrentJobSet { node, job_id: Some(job_id) })?;

        Ok(inner.state.get_job(&job_id).cloned())
    }

    /// §4.7 step 8: release a finished job's slot on its node — subtract
    /// its declared budget from the projection (floored at zero by
    /// `NodeRecord::subtract_projected`) and clear the current-job
    /// pointer. Called once the job has reached a terminal status.
    pub fn release_node_slot(&self, node: NodeIndex, declared_budget_secs: u32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            Event::NodeProjectedQueueDelta { node, delta_secs: -(declared_budget_secs as i64) },
        )?;
        self.commit(&mut inner, Event::NodeCurrentJobSet { node, job_id: None })
    }

    /// §4.7 crash recovery: jobs assigned to `node` left in
    /// {launching, running, retrieving} when the worker starts up.
    pub fn in_flight_jobs_for_node(&self, node: NodeIndex) -> Vec<Job> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .filter(|j| {
                j.node == node
                    && matches!(j.status, JobStatus::Launching | JobStatus::Running | JobStatus::Retrieving)
            })
            .cloned()
            .collect()
    }

    // -- nodes ------------------------------------------------------------

    pub fn upsert_node_reachability(&self, node: NodeIndex, reachable: bool, quarantined: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::NodeReachabilityChanged { node, reachable, quarantined })
    }

    pub fn set_node_current_job(&self, node: NodeIndex, job_id: Option<JobId>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::NodeCurrentJobSet { node, job_id })
    }

    pub fn node_snapshot(&self, node: NodeIndex) -> Option<NodeRecord> {
        self.inner.lock().state.nodes.get(&node).cloned()
    }

    pub fn all_nodes(&self) -> Vec<NodeRecord> {
        let inner = self.inner.lock();
        let mut v: Vec<_> = inner.state.nodes.values().cloned().collect();
        v.sort_by_key(|n| n.index);
        v
    }

    // -- credentials ------------------------------------------------------

    /// §3: "Creating a new credential for a principal atomically
    /// deactivates all prior credentials for that principal." Both
    /// events are appended, applied, and (crucially) flushed as one
    /// commit so a reader can never observe the new credential without
    /// the deactivation already having taken effect.
    pub fn insert_credential(&self, credential: Credential) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let principal = credential.principal.clone();
        let id = credential.id;
        self.commit(&mut inner, Event::CredentialCreated { credential: Box::new(credential) })?;
        self.commit(
            &mut inner,
            Event::CredentialsDeactivatedForPrincipal { principal, except: Some(id) },
        )
    }

    pub fn lookup_credential_by_hash(&self, hash: &str) -> Option<Credential> {
        self.inner.lock().state.credential_by_hash(hash).cloned()
    }

    // -- quota / rate -----------------------------------------------------

    pub fn record_submission(&self, principal: &Principal, at_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::RateSubmissionRecorded { principal: principal.clone(), at_ms })
    }

    pub fn rate_window_snapshot(&self, principal: &str) -> bq_core::RateWindow {
        self.inner.lock().state.rate_windows.get(principal).cloned().unwrap_or_default()
    }

    // -- admission (C4 Quota + C5 Placer, atomic with the job insert) ----

    /// §4.4 + §4.5 combined: checks rate and concurrency quota, places
    /// the job on the least-loaded node, and inserts it — all under one
    /// lock acquisition, so two concurrent submissions from the same
    /// principal can never both observe zero active jobs and both
    /// succeed (§4.4's atomicity requirement; see also §8 "Single
    /// active").
    #[allow(clippy::too_many_arguments)]
    pub fn admit_job(
        &self,
        owner: Principal,
        code_pointer: String,
        declared_budget_secs: u32,
        competition_tag: Option<String>,
        project_tag: Option<String>,
        all_node_indices: &[NodeIndex],
        rate_limit_per_minute: u32,
        max_active_jobs: u32,
        now_ms: u64,
    ) -> Result<Job, AdmitError> {
        let mut inner = self.inner.lock();

        let mut window = inner.state.rate_windows.get(&owner).cloned().unwrap_or_default();
        bq_quota::check_rate(&mut window, now_ms, rate_limit_per_minute)?;

        let active_for_owner =
            inner.state.jobs.values().filter(|j| j.owner == owner && j.status.is_active()).count();
        bq_quota::check_concurrency(active_for_owner, max_active_jobs)?;

        let nodes: Vec<NodeRecord> = inner.state.nodes.values().cloned().collect();
        let node = bq_scheduler::place(all_node_indices, &nodes);

        let job = Job {
            id: JobId::new(),
            owner: owner.clone(),
            node,
            declared_budget_secs,
            status: JobStatus::Queued,
            remote_pid: None,
            stdout: None,
            stderr: None,
            exit_status: None,
            result_artifact: None,
            created_at: now_ms,
            started_at: None,
            finished_at: None,
            code_pointer,
            competition_tag,
            project_tag,
            cancellation_requested: false,
        };

        self.commit(&mut inner, Event::RateSubmissionRecorded { principal: owner, at_ms: now_ms })?;
        self.commit(
            &mut inner,
            Event::NodeProjectedQueueDelta { node, delta_secs: declared_budget_secs as i64 },
        )?;
        self.commit(&mut inner, Event::JobAdmitted { job: Box::new(job.clone()) })?;

        Ok(job)
    }

    /// §9's implementer-owned result-retention sweep (SPEC_FULL.md §5):
    /// terminal jobs finished at or before `cutoff_ms` that still carry
    /// captured output. The job rows themselves are never returned for
    /// deletion here — only artifact-bearing candidates for purge.
    pub fn terminal_jobs_with_artifacts_before(&self, cutoff_ms: u64) -> Vec<Job> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .filter(|j| {
                j.status.is_terminal()
                    && j.finished_at.is_some_and(|f| f <= cutoff_ms)
                    && (j.stdout.is_some() || j.stderr.is_some() || j.result_artifact.is_some())
            })
            .cloned()
            .collect()
    }

    pub fn purge_job_artifacts(&self, id: JobId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobArtifactsPurged { job_id: id })
    }

    // -- cancellation (C6, §4.6) ------------------------------------------

    /// §4.6: mark a job cancelled if it exists, is in a cancellable
    /// state, and the caller is the owner or admin. Ownership is
    /// enforced by the caller (`bq-api`'s uniform `authorize_job`,
    /// per SPEC_FULL.md §5) before this is reached; this performs the
    /// existence + state-machine half atomically so a cancel can't race
    /// a worker's own terminal transition.
    pub fn cancel_job(&self, id: JobId, at_ms: u64) -> Result<Job, CancelError> {
        let mut inner = self.inner.lock();
        let job = inner.state.get_job(&id).cloned().ok_or(CancelError::NotFound)?;
        bq_scheduler::check_cancel_eligible(&job).map_err(|_| CancelError::TerminalState)?;

        self.commit(&mut inner, Event::JobCancellationRequested { job_id: id })?;
        if job.status == JobStatus::Queued {
            // A queued job has no worker watching it yet; cancel takes
            // effect immediately rather than waiting for a poll (§4.6:
            // "removes it from the ready view immediately"). It also
            // never reaches `Worker::finish_job`'s `release_node_slot`,
            // so the projection has to be released here instead — a
            // cancelled job is not active and must not keep inflating
            // its node's projected queue time (§8 "No placement leak").
            self.commit(
                &mut inner,
                Event::NodeProjectedQueueDelta {
                    node: job.node,
                    delta_secs: -(job.declared_budget_secs as i64),
                },
            )?;
            self.commit(&mut inner, Event::JobStatusChanged { job_id: id, status: JobStatus::Cancelled, at_ms })?;
        }

        inner.state.get_job(&id).cloned().ok_or(CancelError::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum AdmitError {
    #[error(transparent)]
    Quota(#[from] QuotaError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("job not found")]
    NotFound,
    #[error("job is in a terminal or non-cancellable state")]
    TerminalState,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
