//! # metrics-relay
//!
//! A metrics agent and the ingestion server it reports to.
//!
//! The agent samples process and host statistics into an in-memory
//! [`MetricStore`](core::metrics::MetricStore) and ships them on a timer:
//! counters as deltas, gauges as their latest value. Bodies are signed with
//! a shared secret, optionally encrypted with the server's public key, and
//! gzip-compressed. Deliveries are bounded by a semaphore and retried with
//! exponential backoff.
//!
//! The server verifies and applies updates to its own store, answers with
//! the merged value, and snapshots the store to a JSON file or a database.
//!
//! ## Server
//!
//! ```rust,no_run
//! use metrics_relay::config::ServerSettings;
//! use metrics_relay::runner::ServerRunner;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ServerSettings::from_file("config/server.yaml").await?;
//!     ServerRunner::new(settings).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Store
//!
//! ```rust
//! use metrics_relay::core::metrics::MetricStore;
//!
//! let store = MetricStore::new();
//! store.collect("Requests", "counter", "5").unwrap();
//! store.collect("Requests", "counter", "10").unwrap();
//! assert_eq!(store.get("Requests").unwrap().text(), "15");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod agent;
pub mod config;
pub mod core;
pub mod runner;
pub mod server;
pub mod storage;
pub mod utils;

pub use utils::error::{MetricsError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Unix timestamp of the build
    pub build_time: &'static str,
    pub git_hash: &'static str,
    pub rust_version: &'static str,
}

impl BuildInfo {
    /// Information baked in by the build script
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}
