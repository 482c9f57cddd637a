// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /jobs` (§6.1): `status?`, `principal?` (ignored for non-admin),
//! `limit?`.

use crate::auth::AuthContext;
use crate::dto::JobSummary;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use bq_core::{Clock, JobStatus};
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub status: Option<JobStatus>,
    pub principal: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_jobs<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    auth: AuthContext,
    Query(query): Query<JobsQuery>,
) -> Result<Json<Vec<JobSummary>>, ApiError> {
    let principal_filter = if auth.is_admin { query.principal.as_deref() } else { Some(auth.principal.as_str()) };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let jobs = state.store.query_jobs(principal_filter, query.status, limit);
    Ok(Json(jobs.iter().map(JobSummary::from_job).collect()))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
