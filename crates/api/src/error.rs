// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The one place in the workspace allowed to erase error types into the
//! §7 taxonomy: every handler converts whatever its callees returned
//! into an [`ApiError`] and lets [`IntoResponse`] render it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bq_core::{ErrorKind, TaxonomyError};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ApiError(pub TaxonomyError);

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self(TaxonomyError::new(kind, message))
    }
}

impl From<TaxonomyError> for ApiError {
    fn from(e: TaxonomyError) -> Self {
        Self(e)
    }
}

impl From<bq_storage::ReadError> for ApiError {
    fn from(e: bq_storage::ReadError) -> Self {
        match e {
            bq_storage::ReadError::NotFound => ApiError::new(ErrorKind::NotFound, "job not found"),
            bq_storage::ReadError::Storage(e) => ApiError::new(ErrorKind::Storage, e.to_string()),
        }
    }
}

impl From<bq_storage::StoreError> for ApiError {
    fn from(e: bq_storage::StoreError) -> Self {
        ApiError::new(ErrorKind::Storage, e.to_string())
    }
}

impl From<bq_storage::AdmitError> for ApiError {
    fn from(e: bq_storage::AdmitError) -> Self {
        match e {
            bq_storage::AdmitError::Quota(q) => {
                let kind = match q {
                    bq_quota::QuotaError::RateLimited { .. } => ErrorKind::QuotaRate,
                    bq_quota::QuotaError::ConcurrencyExceeded => ErrorKind::QuotaConcurrent,
                };
                let retry_after = q.retry_after();
                let mut err = TaxonomyError::new(kind, q.to_string());
                if let Some(d) = retry_after {
                    err = err.with_retry_after(d);
                }
                ApiError(err)
            }
            bq_storage::AdmitError::Storage(e) => ApiError::new(ErrorKind::Storage, e.to_string()),
        }
    }
}

impl From<bq_storage::CancelError> for ApiError {
    fn from(e: bq_storage::CancelError) -> Self {
        match e {
            bq_storage::CancelError::NotFound => ApiError::new(ErrorKind::NotFound, "job not found"),
            bq_storage::CancelError::TerminalState => {
                ApiError::new(ErrorKind::TerminalState, "job is in a terminal or non-cancellable state")
            }
            bq_storage::CancelError::Storage(e) => ApiError::new(ErrorKind::Storage, e.to_string()),
        }
    }
}

impl From<crate::config::ConfigError> for ApiError {
    fn from(e: crate::config::ConfigError) -> Self {
        ApiError::new(ErrorKind::Storage, e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::new(ErrorKind::Storage, e.to_string())
    }
}

impl From<bq_auth::AuthError> for ApiError {
    fn from(e: bq_auth::AuthError) -> Self {
        match e {
            bq_auth::AuthError::Unauthenticated => {
                ApiError::new(ErrorKind::Unauthenticated, "unknown or revoked credential")
            }
            bq_auth::AuthError::Storage(e) => ApiError::new(ErrorKind::Storage, e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: ErrorKind,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<f64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.0.kind,
                message: &self.0.message,
                retry_after: self.0.retry_after.map(|d| d.as_secs_f64()),
            },
        };
        (status, Json(body)).into_response()
    }
}
