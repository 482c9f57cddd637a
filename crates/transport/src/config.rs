// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use secrecy::SecretString;
use std::time::Duration;

/// Everything a `SshTransport` needs to reach one node through the
/// bastion (§4.2). One of these per node; never shared across workers
/// (§4.7's "no cross-worker sharing").
#[derive(Clone)]
pub struct NodeTarget {
    pub bastion_host: String,
    pub bastion_port: u16,
    pub bastion_user: String,
    pub bastion_key_path: Option<String>,
    pub bastion_password: Option<SecretString>,
    pub node_host: String,
    pub node_port: u16,
    pub node_user: String,
    pub node_key_path: Option<String>,
    pub node_password: Option<SecretString>,
    /// Allow a direct node connection when the bastion hop cannot be
    /// established (§4.2: "transport MAY fall back to direct connection
    /// when configured").
    pub allow_direct_fallback: bool,
}

/// Reconnect/back-off posture (§4.2, SPEC_FULL.md §4's `reconnect_*`
/// knobs).
#[derive(Clone, Copy, Debug)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            max_attempts: 8,
        }
    }
}

impl ReconnectPolicy {
    /// Exponential back-off with a hard ceiling, doubling per attempt
    /// starting at `initial_delay`. `attempt` is 0-based.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(20)).unwrap_or(u64::MAX);
        let scaled = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(scaled.min(self.max_delay.as_millis() as u64))
    }
}

/// Per-call timeout budgets (§4.2's "connection establishment uses an
/// overall budget and a banner/auth sub-budget").
#[derive(Clone, Copy, Debug)]
pub struct TimeoutPolicy {
    pub connect_overall: Duration,
    pub handshake: Duration,
    pub exec_default: Duration,
    pub keepalive_interval: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            connect_overall: Duration::from_secs(15),
            handshake: Duration::from_secs(5),
            exec_default: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(20),
        }
    }
}
