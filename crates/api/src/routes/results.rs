// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /results/{id}` (§6.1).

use crate::auth::AuthContext;
use crate::dto::ResultsResponse;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use bq_core::Clock;

pub async fn results<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let job = state.store.resolve_job(&id)?;
    auth.authorize_job(&job)?;
    Ok(Json(ResultsResponse::from_job(&job)))
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
