// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bearer-credential extractor (C3, §4.3) and the uniform ownership
//! check every ownership-gated route applies (§4.8, SPEC_FULL.md §5's
//! resolution of open question 1).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use bq_core::{Clock, ErrorKind, Job, Principal};

/// The authenticated caller for one request: who they are, and whether
/// ownership filtering is waived for them.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub is_admin: bool,
}

impl AuthContext {
    /// §4.8: "reads that return job data are filtered so that non-admin
    /// principals see only their own rows." Resolved as 404 rather than
    /// 403 for a non-admin caller on a job they don't own (SPEC_FULL.md
    /// §5, open question 1) — the same response an unrelated, truly
    /// nonexistent id would produce, so a probing caller learns nothing
    /// about which ids exist.
    pub fn authorize_job(&self, job: &Job) -> Result<(), ApiError> {
        if self.is_admin || job.owner == self.principal {
            Ok(())
        } else {
            Err(ApiError::new(ErrorKind::NotFound, "job not found"))
        }
    }
}

#[axum::async_trait]
impl<C> FromRequestParts<AppState<C>> for AuthContext
where
    C: Clock + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<C>) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::new(ErrorKind::Unauthenticated, "missing bearer credential"))?;
        let secret = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::new(ErrorKind::Unauthenticated, "malformed authorization header"))?;

        let (principal, is_admin) = state.auth.validate(secret, state.clock.epoch_ms())?;
        Ok(AuthContext { principal, is_admin })
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
