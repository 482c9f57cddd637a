// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /nodes` (§6.1): no auth required.

use crate::dto::NodeStats;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use bq_core::Clock;

pub async fn nodes<C: Clock + 'static>(State(state): State<AppState<C>>) -> Json<Vec<NodeStats>> {
    let rows = state
        .store
        .all_nodes()
        .into_iter()
        .map(|n| NodeStats {
            index: n.index.0,
            projected_queue_secs: n.projected_queue_secs,
            busy: n.is_busy(),
            address_tag: n.address_tag,
        })
        .collect();
    Json(rows)
}

#[cfg(test)]
#[path = "nodes_tests.rs"]
mod tests;
