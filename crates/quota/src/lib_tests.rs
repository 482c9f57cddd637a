// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::RateWindow;
use yare::parameterized;

#[parameterized(
    under_limit = { 4, 5, true },
    at_limit = { 5, 5, false },
    over_limit = { 6, 5, false },
)]
fn rate_window_boundary(submissions: u32, limit: u32, expect_ok: bool) {
    let mut window = RateWindow::new();
    for i in 0..submissions {
        window.record(i as u64 * 1000);
    }
    let result = check_rate(&mut window, submissions as u64 * 1000, limit);
    assert_eq!(result.is_ok(), expect_ok);
}

#[test]
fn sixth_submission_in_window_carries_positive_retry_after() {
    let mut window = RateWindow::new();
    for i in 0..5 {
        window.record(i * 1000);
    }
    let err = check_rate(&mut window, 4_000, 5).unwrap_err();
    match err {
        QuotaError::RateLimited { retry_after_ms } => assert!(retry_after_ms > 0),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[test]
fn stale_entries_evicted_before_check() {
    let mut window = RateWindow::new();
    for i in 0..5 {
        window.record(i * 1000);
    }
    // 70s later the whole window has rolled off.
    assert!(check_rate(&mut window, 70_000, 5).is_ok());
}

#[parameterized(
    zero_active = { 0, 1, true },
    one_active_default_cap = { 1, 1, false },
    under_custom_cap = { 2, 3, true },
    at_custom_cap = { 3, 3, false },
)]
fn concurrency_boundary(active: usize, max_active: u32, expect_ok: bool) {
    assert_eq!(check_concurrency(active, max_active).is_ok(), expect_ok);
}

#[test]
fn concurrency_error_has_no_retry_after() {
    let err = check_concurrency(1, 1).unwrap_err();
    assert!(err.retry_after().is_none());
}
