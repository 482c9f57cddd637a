// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /status/{id}` (§6.1).

use crate::auth::AuthContext;
use crate::dto::StatusResponse;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use bq_core::Clock;

pub async fn status<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state.store.resolve_job(&id)?;
    auth.authorize_job(&job)?;
    let queue_position = state.store.queue_position(job.id);
    Ok(Json(StatusResponse::from_job(&job, queue_position)))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
