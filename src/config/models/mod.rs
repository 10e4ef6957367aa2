//! Configuration data models
//!
//! This module defines the configuration structures shared by the server and the agent.

#![allow(missing_docs)]

pub mod agent;
pub mod logging;
pub mod security;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use agent::*;
pub use logging::*;
pub use security::*;
pub use server::*;
pub use storage::*;

/// Default address of the ingestion server
pub fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default persistence interval in seconds
pub fn default_store_interval() -> u64 {
    15
}

/// Default file storage location
pub fn default_file_storage_path() -> String {
    "/tmp/metrics-db.json".to_string()
}

/// Default report interval in seconds
pub fn default_report_interval() -> u64 {
    5
}

/// Default poll interval in seconds
pub fn default_poll_interval() -> u64 {
    1
}

/// Default number of concurrent deliveries
pub fn default_rate_limit() -> usize {
    1
}

/// Default HTTP request timeout in seconds
pub fn default_timeout() -> u64 {
    10
}

/// Default graceful shutdown timeout in seconds
pub fn default_shutdown_timeout() -> u64 {
    10
}

/// Default maximum request body size in bytes
pub fn default_max_body_size() -> usize {
    4 * 1024 * 1024 // 4MB
}

/// Default idempotency window in seconds
pub fn default_replay_ttl() -> u64 {
    300
}

pub fn default_replay_capacity() -> u64 {
    10_000
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}
