// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy every component maps its failures into (§7).
//!
//! Crates below `bq-api` return their own `thiserror` enums; this type
//! is the shared vocabulary those enums convert into at the boundary
//! where a human- or client-facing outcome is needed (job records,
//! HTTP responses).

use std::time::Duration;

/// A taxonomy-classified failure. Carries enough detail to log and to
/// render, but intentionally does not carry the originating error's
/// concrete type — by the time something becomes a `TaxonomyError` it is
/// meant to be surfaced, not downcast.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TaxonomyError {
    pub kind: ErrorKind,
    pub message: String,
    /// Only meaningful for `ErrorKind::QuotaRate`.
    pub retry_after: Option<Duration>,
}

impl TaxonomyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), retry_after: None }
    }

    pub fn with_retry_after(mut self, d: Duration) -> Self {
        self.retry_after = Some(d);
        self
    }
}

/// Kinds from §7. Order here is not significant; each variant documents
/// its own HTTP surface for crates that need to map it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Missing/invalid/expired credential. Surfaces as 401.
    Unauthenticated,
    /// Credential does not match the claimed principal. Surfaces as 403.
    PrincipalMismatch,
    /// Caller lacks rights to a resource. Surfaces as 403.
    Forbidden,
    /// Entity does not exist. Surfaces as 404.
    NotFound,
    /// Operation invalid in the entity's current state. Surfaces as 400.
    TerminalState,
    /// Malformed config, missing fields, non-positive budget. Surfaces as 400.
    Validation,
    /// Rate limit exceeded. Surfaces as 429, carries retry-after.
    QuotaRate,
    /// Principal already has an active job. Surfaces as 429.
    QuotaConcurrent,
    /// Remote-side failure. Recorded on the job; does not surface on submit.
    Transport,
    /// Durable write failure. Surfaces as 500.
    Storage,
    /// Pre-admission screening denied the artifact. Surfaces as 400.
    ScannerReject,
}

crate::simple_display! {
    ErrorKind {
        Unauthenticated => "unauthenticated",
        PrincipalMismatch => "principal-mismatch",
        Forbidden => "forbidden",
        NotFound => "not-found",
        TerminalState => "terminal-state",
        Validation => "validation",
        QuotaRate => "quota-rate",
        QuotaConcurrent => "quota-concurrent",
        Transport => "transport",
        Storage => "storage",
        ScannerReject => "scanner-reject",
    }
}

impl ErrorKind {
    /// The HTTP status this kind maps to, per §7's Surface column.
    /// `Transport` has no synchronous surface (it only ever appears on a
    /// job record), so callers that need a status for it are misusing it.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Unauthenticated => 401,
            ErrorKind::PrincipalMismatch | ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::TerminalState
            | ErrorKind::Validation
            | ErrorKind::ScannerReject => 400,
            ErrorKind::QuotaRate | ErrorKind::QuotaConcurrent => 429,
            ErrorKind::Storage => 500,
            ErrorKind::Transport => 500,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
