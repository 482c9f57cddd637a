// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::hash::hash_secret;
use bq_core::{Credential, Principal};
use bq_storage::Store;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown or revoked credential")]
    Unauthenticated,
    #[error("storage error: {0}")]
    Storage(#[from] bq_storage::StoreError),
}

/// A freshly issued credential and the one and only time its plaintext
/// secret is available — the caller must hand it to the principal now.
pub struct IssuedCredential {
    pub credential: Credential,
    pub plaintext_secret: String,
}

/// Credential validation and issuance (C3, §4.3).
pub struct AuthService {
    store: Arc<Store>,
    max_expiry_secs: u64,
}

impl AuthService {
    pub fn new(store: Arc<Store>, max_expiry_secs: u64) -> Self {
        Self { store, max_expiry_secs }
    }

    /// Validate a presented bearer secret, returning `(principal,
    /// is_admin)` on success. Rejects unknown, inactive, and expired
    /// credentials identically (§4.3) — the caller never learns which.
    pub fn validate(&self, bearer_secret: &str, now_ms: u64) -> Result<(Principal, bool), AuthError> {
        let hash = hash_secret(bearer_secret);
        let credential = self.store.lookup_credential_by_hash(&hash).ok_or(AuthError::Unauthenticated)?;
        if !credential.is_valid_at(now_ms) {
            return Err(AuthError::Unauthenticated);
        }
        Ok((credential.principal, credential.is_admin))
    }

    /// Issue a new credential for `principal`, clamping the requested
    /// expiry to the policy maximum. Persisting it atomically
    /// deactivates all prior credentials for the same principal
    /// (`Store::insert_credential`, §3).
    pub fn issue(
        &self,
        principal: Principal,
        is_admin: bool,
        requested_expiry_ms: u64,
        now_ms: u64,
    ) -> Result<IssuedCredential, AuthError> {
        let plaintext_secret = nanoid::nanoid!(32);
        let hash = hash_secret(&plaintext_secret);
        let policy_ceiling = now_ms.saturating_add(self.max_expiry_secs.saturating_mul(1000));
        let expires_at = requested_expiry_ms.min(policy_ceiling);

        let credential = Credential::new(principal, hash, is_admin, now_ms, expires_at);
        self.store.insert_credential(credential.clone())?;
        Ok(IssuedCredential { credential, plaintext_secret })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
