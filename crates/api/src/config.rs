// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration (SPEC_FULL.md §3): TOML file, `#[serde(deny_unknown_fields)]`
//! at every level, the same strict posture spec §9 mandates for the
//! submit config payload.

use bq_transport::{NodeTarget, ReconnectPolicy, TimeoutPolicy};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("could not parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("{0}")]
    Validation(String),
}

fn default_bastion_port() -> u16 {
    22
}

fn default_node_port() -> u16 {
    22
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeAddress {
    pub host: String,
    #[serde(default = "default_node_port")]
    pub port: u16,
}

/// Recognized configuration (spec §6.4) plus the ambient keys
/// SPEC_FULL.md §3 adds to run the system. Unknown keys are a hard
/// error at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiConfig {
    // -- §6.4 ------------------------------------------------------------
    pub num_nodes: u32,
    pub bastion_address: String,
    #[serde(default = "default_bastion_port")]
    pub bastion_port: u16,
    pub bastion_user: String,
    pub bastion_secondary: Option<String>,
    pub bastion_key_path: Option<String>,
    pub bastion_password: Option<String>,
    pub node_addresses: Vec<NodeAddress>,
    pub remote_user: String,
    pub remote_secret: Option<String>,
    pub remote_key_path: Option<String>,
    pub submit_rate_per_minute: u32,
    pub max_active_jobs_per_principal: u32,
    pub credential_max_validity_days: u64,
    pub wall_clock_multiplier: u32,
    pub wait_max_seconds: u64,
    pub scanner_enabled: bool,
    pub scanner_quick: bool,
    pub restart_remote_workspace: bool,

    // -- ambient (SPEC_FULL.md §3) ----------------------------------------
    pub state_dir: Option<String>,
    pub log_level: Option<String>,
    pub listen_addr: String,
    pub supervision_poll_interval_ms: u64,
    pub reconnect_initial_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub reconnect_max_attempts: u32,
    pub result_retention_hours: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            num_nodes: 1,
            bastion_address: String::new(),
            bastion_port: default_bastion_port(),
            bastion_user: String::new(),
            bastion_secondary: None,
            bastion_key_path: None,
            bastion_password: None,
            node_addresses: Vec::new(),
            remote_user: String::new(),
            remote_secret: None,
            remote_key_path: None,
            submit_rate_per_minute: 30,
            max_active_jobs_per_principal: 1,
            credential_max_validity_days: 90,
            wall_clock_multiplier: 2,
            wait_max_seconds: 300,
            scanner_enabled: false,
            scanner_quick: false,
            restart_remote_workspace: false,
            state_dir: None,
            log_level: None,
            listen_addr: "127.0.0.1:8080".to_string(),
            supervision_poll_interval_ms: 2000,
            reconnect_initial_delay_ms: 200,
            reconnect_max_delay_ms: 30_000,
            reconnect_max_attempts: 8,
            result_retention_hours: 72,
        }
    }
}

impl ApiConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_nodes == 0 {
            return Err(ConfigError::Validation("num_nodes must be positive".to_string()));
        }
        if self.node_addresses.len() != self.num_nodes as usize {
            return Err(ConfigError::Validation(format!(
                "node_addresses has {} entries, expected num_nodes={}",
                self.node_addresses.len(),
                self.num_nodes
            )));
        }
        if self.bastion_address.is_empty() {
            return Err(ConfigError::Validation("bastion_address must be set".to_string()));
        }
        Ok(())
    }

    pub fn resolved_state_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.state_dir {
            return Ok(PathBuf::from(dir));
        }
        crate::env::state_dir().ok_or_else(|| {
            ConfigError::Validation("state_dir not configured and no BQ_STATE_DIR/HOME fallback available".to_string())
        })
    }

    /// Build the [`NodeTarget`] for node `idx`, bound through the
    /// configured bastion (§4.2's two-hop addressing).
    pub fn node_target(&self, idx: usize) -> NodeTarget {
        let node = &self.node_addresses[idx];
        NodeTarget {
            bastion_host: self.bastion_address.clone(),
            bastion_port: self.bastion_port,
            bastion_user: self.bastion_user.clone(),
            bastion_key_path: self.bastion_key_path.clone(),
            bastion_password: self.bastion_password.clone().map(SecretString::new),
            node_host: node.host.clone(),
            node_port: node.port,
            node_user: self.remote_user.clone(),
            node_key_path: self.remote_key_path.clone(),
            node_password: self.remote_secret.clone().map(SecretString::new),
            allow_direct_fallback: self.bastion_secondary.is_some(),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(self.reconnect_initial_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            max_attempts: self.reconnect_max_attempts,
        }
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::default()
    }

    pub fn supervision_poll_interval(&self) -> Duration {
        Duration::from_millis(self.supervision_poll_interval_ms)
    }

    pub fn wait_max(&self) -> Duration {
        Duration::from_secs(self.wait_max_seconds)
    }

    /// Build the per-node [`bq_engine::WorkerConfig`] `bqd` hands each
    /// `Worker`, carrying over the `restart_remote_workspace`/
    /// `wall_clock_multiplier`/poll-interval knobs (§6.4).
    pub fn worker_config(&self, node: bq_core::NodeIndex) -> bq_engine::WorkerConfig {
        let mut wc = bq_engine::WorkerConfig::new(node);
        wc.restart_remote_workspace = self.restart_remote_workspace;
        wc.wall_clock_multiplier = self.wall_clock_multiplier;
        wc.supervision_poll_interval = self.supervision_poll_interval();
        wc
    }

    pub fn all_node_indices(&self) -> Vec<bq_core::NodeIndex> {
        (0..self.num_nodes).map(bq_core::NodeIndex).collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
