// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quota (C4, §4.4): rate and concurrency admission checks.
//!
//! Both checks are pure functions over data the caller already holds —
//! this crate does no I/O and takes no lock. `bq-storage::Store` is the
//! only place that can make the checks atomic with the job insert
//! (§4.4's "both checks MUST be atomic with respect to the subsequent
//! 'create job' write"), by calling these functions from inside the
//! same critical section it uses to commit the insert.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use bq_core::RateWindow;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("rate limit exceeded, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("principal already has an active job")]
    ConcurrencyExceeded,
}

impl QuotaError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            QuotaError::RateLimited { retry_after_ms } => Some(Duration::from_millis(*retry_after_ms)),
            QuotaError::ConcurrencyExceeded => None,
        }
    }
}

/// §4.4 rate check: at most `limit_per_minute` submissions per
/// principal in any rolling 60s window. Does not record the attempt —
/// the caller records only once admission as a whole succeeds, so a
/// rejected submission doesn't itself count against the window.
pub fn check_rate(window: &mut RateWindow, now_ms: u64, limit_per_minute: u32) -> Result<(), QuotaError> {
    if window.would_admit(now_ms, limit_per_minute) {
        Ok(())
    } else {
        Err(QuotaError::RateLimited { retry_after_ms: window.retry_after_ms(now_ms) })
    }
}

/// §4.4 concurrency check: at most one active job per principal (or
/// `max_active` when the policy allows more).
pub fn check_concurrency(active_count_for_principal: usize, max_active: u32) -> Result<(), QuotaError> {
    if (active_count_for_principal as u32) < max_active.max(1) {
        Ok(())
    } else {
        Err(QuotaError::ConcurrencyExceeded)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
