// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    unauthenticated = { ErrorKind::Unauthenticated, 401 },
    principal_mismatch = { ErrorKind::PrincipalMismatch, 403 },
    forbidden = { ErrorKind::Forbidden, 403 },
    not_found = { ErrorKind::NotFound, 404 },
    terminal_state = { ErrorKind::TerminalState, 400 },
    validation = { ErrorKind::Validation, 400 },
    quota_rate = { ErrorKind::QuotaRate, 429 },
    quota_concurrent = { ErrorKind::QuotaConcurrent, 429 },
    storage = { ErrorKind::Storage, 500 },
    scanner_reject = { ErrorKind::ScannerReject, 400 },
)]
fn http_status_matches_taxonomy(kind: ErrorKind, expected: u16) {
    assert_eq!(kind.http_status(), expected);
}

#[test]
fn display_uses_kebab_case_names() {
    assert_eq!(ErrorKind::QuotaRate.to_string(), "quota-rate");
    assert_eq!(ErrorKind::NotFound.to_string(), "not-found");
}

#[test]
fn retry_after_only_set_when_attached() {
    let err = TaxonomyError::new(ErrorKind::QuotaRate, "too fast");
    assert!(err.retry_after.is_none());
    let err = err.with_retry_after(std::time::Duration::from_secs(12));
    assert_eq!(err.retry_after, Some(std::time::Duration::from_secs(12)));
}

#[test]
fn serde_round_trip_kebab_case() {
    let json = serde_json::to_string(&ErrorKind::PrincipalMismatch).unwrap_or_default();
    assert_eq!(json, "\"principal-mismatch\"");
}
