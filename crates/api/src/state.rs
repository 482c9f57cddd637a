// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state every handler closes over. Generic over [`Clock`] so
//! integration tests can substitute [`bq_core::FakeClock`] the same way
//! `bq-engine`'s `Worker<T, C>` does.

use crate::config::ApiConfig;
use crate::scanner::{NoOpScanner, ScannerHook};
use bq_auth::AuthService;
use bq_core::Clock;
use bq_storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<C: Clock> {
    pub store: Arc<Store>,
    pub auth: Arc<AuthService>,
    pub config: Arc<ApiConfig>,
    pub clock: C,
    pub scanner: Arc<dyn ScannerHook>,
}

impl<C: Clock> AppState<C> {
    pub fn new(store: Arc<Store>, auth: Arc<AuthService>, config: Arc<ApiConfig>, clock: C) -> Self {
        Self { store, auth, config, clock, scanner: Arc::new(NoOpScanner) }
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn ScannerHook>) -> Self {
        self.scanner = scanner;
        self
    }
}
