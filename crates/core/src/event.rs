// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event vocabulary the WAL persists and `MaterializedState` replays.
//!
//! Every durable state change in the system is one of these variants.
//! Handlers (in `bq-storage::state`) apply them idempotently: replaying
//! the same event twice must leave the state unchanged from the first
//! application.

use crate::credential::CredentialId;
use crate::job::{ExitStatus, JobId, JobStatus};
use crate::node::NodeIndex;
use crate::Principal;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    JobAdmitted {
        job: Box<crate::job::Job>,
    },
    JobStatusChanged {
        job_id: JobId,
        status: JobStatus,
        at_ms: u64,
    },
    JobPidCaptured {
        job_id: JobId,
        pid: u64,
    },
    JobOutputsCaptured {
        job_id: JobId,
        stdout: Option<String>,
        stderr: Option<String>,
        result_artifact: Option<String>,
        exit_status: Option<ExitStatus>,
    },
    JobCancellationRequested {
        job_id: JobId,
    },
    /// Ambient retention sweep (SPEC_FULL.md §5): clears a terminal
    /// job's captured stdout/stderr/result artifact past the retention
    /// window. The job row itself survives — row deletion stays an
    /// administrative concern outside this core (§3's lifecycle note).
    JobArtifactsPurged {
        job_id: JobId,
    },
    NodeProjectedQueueDelta {
        node: NodeIndex,
        delta_secs: i64,
    },
    NodeReachabilityChanged {
        node: NodeIndex,
        reachable: bool,
        quarantined: bool,
    },
    NodeCurrentJobSet {
        node: NodeIndex,
        job_id: Option<JobId>,
    },
    CredentialCreated {
        credential: Box<crate::credential::Credential>,
    },
    CredentialsDeactivatedForPrincipal {
        principal: Principal,
        except: Option<CredentialId>,
    },
    RateSubmissionRecorded {
        principal: Principal,
        at_ms: u64,
    },
}
