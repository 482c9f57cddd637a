// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential event handlers (§3, §4.3).

use bq_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::CredentialCreated { credential } => {
            // Idempotent insert; the same credential id is never reissued.
            if !state.credentials.contains_key(&credential.id) {
                state.credential_by_hash.insert(credential.secret_hash.clone(), credential.id);
                state.credentials.insert(credential.id, (**credential).clone());
            }
        }

        Event::CredentialsDeactivatedForPrincipal { principal, except } => {
            for cred in state.credentials.values_mut() {
                if &cred.principal == principal && Some(cred.id) != *except {
                    cred.active = false;
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
