// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Transport-level failures (§4.2). The rest of the core only ever sees
/// this enum — never an `ssh2::Error` or `std::io::Error` directly, so
/// swapping the underlying library stays a one-crate change.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bastion unreachable at {0}")]
    BastionUnreachable(String),
    #[error("node unreachable via bastion: {0}")]
    NodeUnreachable(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("channel is dead and reconnection failed: {0}")]
    ChannelDead(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

impl From<ssh2::Error> for TransportError {
    fn from(e: ssh2::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}
