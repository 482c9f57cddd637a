// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_storage::Store;
use tempfile::tempdir;

fn service() -> (AuthService, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open"));
    (AuthService::new(store, 3600), dir)
}

#[test]
fn issue_then_validate_round_trips() {
    let (auth, _dir) = service();
    let issued = auth.issue("alice".to_string(), false, u64::MAX, 0).expect("issue");
    let (principal, is_admin) = auth.validate(&issued.plaintext_secret, 10).expect("validate");
    assert_eq!(principal, "alice");
    assert!(!is_admin);
}

#[test]
fn validate_rejects_unknown_secret() {
    let (auth, _dir) = service();
    assert!(matches!(auth.validate("nope", 0), Err(AuthError::Unauthenticated)));
}

#[test]
fn validate_rejects_expired_credential() {
    let (auth, _dir) = service();
    let issued = auth.issue("alice".to_string(), false, 1_000, 0).expect("issue");
    assert!(matches!(auth.validate(&issued.plaintext_secret, 2_000), Err(AuthError::Unauthenticated)));
}

#[test]
fn expiry_is_clamped_to_policy_maximum() {
    let (auth, _dir) = service();
    let issued = auth.issue("alice".to_string(), false, u64::MAX, 0).expect("issue");
    assert_eq!(issued.credential.expires_at, 3600 * 1000);
}

#[test]
fn issuing_a_new_credential_deactivates_the_prior_one() {
    let (auth, _dir) = service();
    let first = auth.issue("alice".to_string(), false, u64::MAX, 0).expect("issue");
    let _second = auth.issue("alice".to_string(), false, u64::MAX, 0).expect("issue");
    assert!(matches!(auth.validate(&first.plaintext_secret, 10), Err(AuthError::Unauthenticated)));
}
