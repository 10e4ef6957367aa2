//! Snapshotting the server store to durable storage

use crate::core::metrics::MetricStore;
use crate::storage::MetricsStorage;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Moves the metric table between memory and a [`MetricsStorage`] backend
pub struct PersistenceManager {
    store: Arc<MetricStore>,
    storage: Arc<dyn MetricsStorage>,
    interval: Duration,
    /// Serializes saves so an older snapshot never lands after a newer one
    save_lock: Mutex<()>,
}

impl std::fmt::Debug for PersistenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceManager")
            .field("storage", &self.storage.name())
            .field("interval", &self.interval)
            .finish()
    }
}

impl PersistenceManager {
    pub fn new(store: Arc<MetricStore>, storage: Arc<dyn MetricsStorage>, interval: Duration) -> Self {
        Self {
            store,
            storage,
            interval,
            save_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn MetricsStorage> {
        &self.storage
    }

    /// Whether every update is saved as soon as it is applied
    pub fn is_synchronous(&self) -> bool {
        self.interval.is_zero()
    }

    /// Load the last snapshot into the store
    pub async fn restore(&self) -> Result<usize> {
        let records = self.storage.restore().await?;
        let count = records.len();
        self.store.import(records)?;
        info!("Restored {} metrics from {} storage", count, self.storage.name());
        Ok(count)
    }

    /// Save the current store contents
    pub async fn save(&self) -> Result<usize> {
        let _guard = self.save_lock.lock().await;
        let records = self.store.export();
        self.storage.save(&records).await?;
        debug!("Persisted {} metrics", records.len());
        Ok(records.len())
    }

    /// Save after an update when running synchronously; failures are logged
    pub async fn after_update(&self) {
        if !self.is_synchronous() {
            return;
        }
        if let Err(e) = self.save().await {
            warn!("Synchronous save failed: {}", e);
        }
    }

    /// Periodic save loop; returns once `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        if self.is_synchronous() {
            debug!("Synchronous persistence, no periodic saves");
            return;
        }

        info!("Saving metrics every {:?}", self.interval);
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.save().await {
                        warn!("Periodic save failed: {}", e);
                    }
                }
            }
        }
        debug!("Periodic saves stopped");
    }
}
