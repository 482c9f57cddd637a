// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::ReconnectPolicy;
use crate::ssh::signal_number;
use std::time::Duration;

#[test]
fn backoff_doubles_until_the_ceiling() {
    let policy = ReconnectPolicy {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(1),
        max_attempts: 10,
    };
    assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(1));
}

#[test]
fn known_signal_names_map_to_posix_numbers() {
    assert_eq!(signal_number("TERM"), 15);
    assert_eq!(signal_number("KILL"), 9);
    assert_eq!(signal_number("made-up"), -1);
}
