// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable access, the `bq-cli` counterpart to
//! `bq-api`'s `env.rs` — the admin CLI must resolve the same state
//! directory the daemon persists to.

use std::path::PathBuf;

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
