// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small shared helpers for event handlers.

/// Find a job whose id starts with `prefix`, when exactly one matches.
/// Mirrors the git-style short-id lookup convenience the CLI wants for
/// `/status/{id}`-style paths typed by hand.
pub(crate) fn find_job_by_prefix<'a>(
    jobs: &'a std::collections::HashMap<bq_core::JobId, bq_core::Job>,
    prefix: &str,
) -> Option<&'a bq_core::Job> {
    let mut matches = jobs.values().filter(|j| j.id.as_str().starts_with(prefix));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}
