// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fresh_node_is_idle_and_reachable() {
    let node = NodeRecord::new(NodeIndex(0), "node-0.internal");
    assert!(!node.is_busy());
    assert!(node.reachable);
    assert_eq!(node.projected_queue_secs, 0);
}

#[test]
fn add_projected_accumulates() {
    let mut node = NodeRecord::new(NodeIndex(1), "node-1.internal");
    node.add_projected(5);
    node.add_projected(10);
    assert_eq!(node.projected_queue_secs, 15);
}

#[test]
fn subtract_projected_floors_at_zero() {
    let mut node = NodeRecord::new(NodeIndex(1), "node-1.internal");
    node.add_projected(5);
    node.subtract_projected(100);
    assert_eq!(node.projected_queue_secs, 0);
}

#[test]
fn node_index_orders_numerically_for_tie_break() {
    let mut indices = vec![NodeIndex(3), NodeIndex(1), NodeIndex(2)];
    indices.sort();
    assert_eq!(indices, vec![NodeIndex(1), NodeIndex(2), NodeIndex(3)]);
}
