// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /submit?wait=bool` (§6.1). The only endpoint whose credential
//! travels inside the multipart body rather than an `Authorization`
//! header — §6.1: "credential inside config payload".

use crate::dto::SubmitResponse;
use crate::error::ApiError;
use crate::scanner::ScanVerdict;
use crate::state::AppState;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use bq_core::{Clock, ErrorKind, SubmitConfig};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    #[serde(default)]
    pub wait: bool,
}

struct SubmitFields {
    artifact_bytes: Vec<u8>,
    config: SubmitConfig,
}

async fn parse_multipart(mut multipart: Multipart) -> Result<SubmitFields, ApiError> {
    let mut artifact_bytes = None;
    let mut config = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(ErrorKind::Validation, format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("artifact") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::new(ErrorKind::Validation, format!("could not read artifact field: {e}")))?;
                artifact_bytes = Some(bytes.to_vec());
            }
            Some("config") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::new(ErrorKind::Validation, format!("could not read config field: {e}")))?;
                let parsed: SubmitConfig = serde_json::from_str(&text)
                    .map_err(|e| ApiError::new(ErrorKind::Validation, format!("invalid config payload: {e}")))?;
                config = Some(parsed);
            }
            _ => {}
        }
    }

    let artifact_bytes =
        artifact_bytes.ok_or_else(|| ApiError::new(ErrorKind::Validation, "missing 'artifact' field"))?;
    let config = config.ok_or_else(|| ApiError::new(ErrorKind::Validation, "missing 'config' field"))?;
    config.validate().map_err(|e| ApiError::new(ErrorKind::Validation, e))?;
    Ok(SubmitFields { artifact_bytes, config })
}

pub async fn submit<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Query(query): Query<SubmitQuery>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let fields = parse_multipart(multipart).await?;
    let now_ms = state.clock.epoch_ms();

    // §6.1: "the credential submitted in the config MUST resolve to the
    // principal it claims; otherwise the submission is rejected with
    // principal-mismatch."
    let (resolved_principal, _is_admin) = state.auth.validate(&fields.config.principal_secret, now_ms)?;
    if resolved_principal != fields.config.principal {
        return Err(ApiError::new(ErrorKind::PrincipalMismatch, "credential does not match claimed principal"));
    }

    if state.config.scanner_enabled {
        let verdict = state.scanner.scan(&fields.artifact_bytes, state.config.scanner_quick).await;
        if let ScanVerdict::Reject { reason_code } = verdict {
            return Err(ApiError::new(ErrorKind::ScannerReject, format!("artifact rejected: {reason_code}")));
        }
    }

    let upload_token = nanoid::nanoid!(16);
    let state_dir = state.config.resolved_state_dir()?;
    let upload_dir = state_dir.join("uploads").join(&upload_token);
    tokio::fs::create_dir_all(&upload_dir).await?;
    let artifact_path = upload_dir.join("artifact");
    tokio::fs::write(&artifact_path, &fields.artifact_bytes).await?;

    let node_indices = state.config.all_node_indices();
    let job = state.store.admit_job(
        fields.config.principal.clone(),
        artifact_path.to_string_lossy().into_owned(),
        fields.config.expected_seconds,
        fields.config.competition_tag.clone(),
        fields.config.project_tag.clone(),
        &node_indices,
        state.config.submit_rate_per_minute,
        state.config.max_active_jobs_per_principal,
        now_ms,
    )?;

    if !query.wait {
        return Ok(Json(SubmitResponse::pending(&job)));
    }

    // §6.1: "with wait=true, the handler suspends for up to a policy
    // maximum; on that maximum, it returns status=running with the job
    // id." Polling interval is fixed and short since this suspends one
    // request-handler task, not a worker.
    const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);
    let deadline = state.clock.now() + state.config.wait_max();
    loop {
        match state.store.read_job(job.id) {
            Ok(current) if current.status.is_terminal() => return Ok(Json(SubmitResponse::finished(&current))),
            Ok(_) if state.clock.now() >= deadline => return Ok(Json(SubmitResponse::pending(&job))),
            Ok(_) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => {
                warn!(job_id = %job.id, "lost track of just-admitted job while waiting");
                return Err(e.into());
            }
        }
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
