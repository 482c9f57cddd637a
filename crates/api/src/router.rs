// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembles the wire surface (§6.1) into one [`axum::Router`], layered
//! with the trace/cors/timeout middleware every `bqd`-family daemon in
//! this workspace's lineage carries.

use crate::routes;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use bq_core::Clock;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_router<C>(state: AppState<C>) -> Router
where
    C: Clock + 'static,
{
    Router::new()
        .route("/submit", post(routes::submit::submit::<C>))
        .route("/status/:id", get(routes::status::status::<C>))
        .route("/results/:id", get(routes::results::results::<C>))
        .route("/cancel/:id", post(routes::cancel::cancel::<C>))
        .route("/jobs", get(routes::jobs::list_jobs::<C>))
        .route("/nodes", get(routes::nodes::nodes::<C>))
        .route("/dashboard", get(routes::dashboard::dashboard::<C>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
