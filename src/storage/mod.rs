//! Persistence backends
//!
//! The server keeps its metric table in memory and snapshots it through a
//! [`MetricsStorage`] backend: a JSON file or a relational database. The
//! backend is chosen once at startup; a database DSN wins over the file path.

/// Database storage module
pub mod database;
/// File storage module
pub mod file;

pub use database::DatabaseStorage;
pub use file::FileStorage;

use crate::config::StorageConfig;
use crate::core::metrics::StoredMetric;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Durable home of metric snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsStorage: Send + Sync {
    /// Persist the full metric set, replacing what was saved before
    async fn save(&self, metrics: &[StoredMetric]) -> Result<()>;

    /// Load the last saved metric set; empty when nothing was saved
    async fn restore(&self) -> Result<Vec<StoredMetric>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and diagnostics
    fn name(&self) -> &'static str;
}

/// Build the backend selected by the configuration
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn MetricsStorage>> {
    if let Some(dsn) = config.database.dsn() {
        info!("Using database storage");
        let storage = DatabaseStorage::connect(dsn, &config.database).await?;
        storage.migrate().await?;
        return Ok(Arc::new(storage));
    }

    info!("Using file storage at {}", config.file_storage_path);
    Ok(Arc::new(FileStorage::new(&config.file_storage_path)))
}
