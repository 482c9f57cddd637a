// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential record (§3, §4.3). `bq-auth` owns hashing and
//! validation; this is the durable shape `bq-storage` persists.

use crate::Principal;

crate::define_id! {
    /// Identifies a credential record.
    pub struct CredentialId("crd-");
}

/// Principal, hash of the secret, admin flag, creation/expiry, active
/// flag (§3). Never holds the plaintext secret.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub principal: Principal,
    pub secret_hash: String,
    pub is_admin: bool,
    pub created_at: u64,
    pub expires_at: u64,
    pub active: bool,
}

impl Credential {
    /// Construct a freshly issued, active credential. `bq-auth` is the
    /// only production caller — everything else goes through the
    /// builder in tests.
    pub fn new(
        principal: Principal,
        secret_hash: String,
        is_admin: bool,
        created_at: u64,
        expires_at: u64,
    ) -> Self {
        Self { id: CredentialId::new(), principal, secret_hash, is_admin, created_at, expires_at, active: true }
    }

    pub fn is_valid_at(&self, now_epoch_ms: u64) -> bool {
        self.active && now_epoch_ms < self.expires_at
    }

    crate::setters! {
        set { active: bool }
    }
}

crate::builder! {
    pub struct CredentialBuilder => Credential {
        into { principal: Principal = "alice" }
        into { secret_hash: String = "hash" }
        set { is_admin: bool = false }
        set { created_at: u64 = 0 }
        set { expires_at: u64 = u64::MAX }
        set { active: bool = true }
        computed { id: CredentialId = CredentialId::new() }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
