// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn valid_when_active_and_unexpired() {
    let cred = Credential::builder().expires_at(1_000u64).build();
    assert!(cred.is_valid_at(500));
    assert!(!cred.is_valid_at(1_000));
}

#[test]
fn invalid_when_deactivated() {
    let cred = Credential::builder().expires_at(1_000u64).active(false).build();
    assert!(!cred.is_valid_at(1));
}

#[test]
fn builder_generates_fresh_ids() {
    let a = Credential::builder().build();
    let b = Credential::builder().build();
    assert_ne!(a.id, b.id);
}
