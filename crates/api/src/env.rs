// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access, the `bq-api` counterpart to
//! the teacher's `daemon/src/env.rs`.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: `BQ_STATE_DIR` > `XDG_STATE_HOME/bastionq` >
/// `~/.local/state/bastionq`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("BQ_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("bastionq"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/bastionq"))
}

pub fn log_dir() -> Option<PathBuf> {
    std::env::var("BQ_LOG_DIR").ok().map(PathBuf::from)
}

pub fn listen_addr() -> Option<String> {
    std::env::var("BQ_LISTEN_ADDR").ok()
}

pub fn config_path() -> Option<PathBuf> {
    std::env::var("BQ_CONFIG").ok().map(PathBuf::from)
}

pub fn drain_timeout() -> Duration {
    std::env::var("BQ_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
