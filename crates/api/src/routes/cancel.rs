// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /cancel/{id}` (§4.6, §6.1).

use crate::auth::AuthContext;
use crate::dto::CancelResponse;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use bq_core::Clock;

pub async fn cancel<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let job = state.store.resolve_job(&id)?;
    auth.authorize_job(&job)?;

    // The wire table shows a literal `{status: cancelled}`, but §4.7
    // makes cancellation of a running job asynchronous (the worker
    // still has to issue a kill and retrieve output) — so this reports
    // the job's actual status right after the request is recorded, not
    // a hardcoded literal. A queued job's cancel does land synchronously
    // (`Store::cancel_job`), so callers mostly do see `cancelled` here.
    let updated = state.store.cancel_job(job.id, state.clock.epoch_ms())?;
    Ok(Json(CancelResponse { job_id: updated.id, status: updated.status }))
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
