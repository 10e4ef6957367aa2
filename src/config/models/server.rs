//! Server configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ingestion server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (`host:port`)
    #[serde(default = "default_address")]
    pub address: String,
    /// Persistence interval in seconds, 0 persists every update synchronously
    #[serde(default = "default_store_interval")]
    pub store_interval: u64,
    /// Restore the last saved state at startup
    #[serde(default = "default_true")]
    pub restore: bool,
    /// Number of worker threads
    pub workers: Option<usize>,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    /// Optional diagnostics listener address
    #[serde(default)]
    pub diagnostics_address: Option<String>,
    /// How long an idempotency key is remembered, in seconds
    #[serde(default = "default_replay_ttl")]
    pub replay_ttl: u64,
    /// Maximum number of remembered idempotency keys
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            store_interval: default_store_interval(),
            restore: true,
            workers: None,
            max_body_size: default_max_body_size(),
            shutdown_timeout: default_shutdown_timeout(),
            diagnostics_address: None,
            replay_ttl: default_replay_ttl(),
            replay_capacity: default_replay_capacity(),
        }
    }
}

impl ServerConfig {
    /// Whether every update is persisted as soon as it is applied
    pub fn is_synchronous_store(&self) -> bool {
        self.store_interval == 0
    }

    pub fn store_interval(&self) -> Duration {
        Duration::from_secs(self.store_interval)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Get the number of workers (defaults to CPU count)
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("Address cannot be empty".to_string());
        }

        if self.max_body_size == 0 {
            return Err("Max body size cannot be 0".to_string());
        }

        if self.shutdown_timeout == 0 {
            return Err("Shutdown timeout cannot be 0".to_string());
        }

        if self.replay_ttl == 0 {
            return Err("Replay TTL cannot be 0".to_string());
        }

        if let Some(diagnostics) = &self.diagnostics_address {
            if diagnostics == &self.address {
                return Err("Diagnostics address must differ from the server address".to_string());
            }
        }

        Ok(())
    }
}
