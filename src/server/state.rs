//! Application state shared across HTTP handlers

use crate::agent::SystemSampler;
use crate::core::metrics::MetricStore;
use crate::runner::lifecycle::Lifecycle;
use crate::runner::persistence::PersistenceManager;
use crate::server::receiver::Receiver;
use crate::storage::MetricsStorage;
use std::sync::Arc;
use std::time::Instant;

/// HTTP server state shared across handlers
///
/// Every field is shared; cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MetricStore>,
    pub receiver: Arc<Receiver>,
    pub persistence: Arc<PersistenceManager>,
    pub lifecycle: Lifecycle,
    pub started_at: Instant,
    /// Process statistics for the diagnostics endpoint
    pub sampler: Arc<SystemSampler>,
}

impl AppState {
    pub fn new(
        receiver: Arc<Receiver>,
        persistence: Arc<PersistenceManager>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            store: receiver.store().clone(),
            receiver,
            persistence,
            lifecycle,
            started_at: Instant::now(),
            sampler: Arc::new(SystemSampler::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn MetricsStorage> {
        self.persistence.storage()
    }
}
