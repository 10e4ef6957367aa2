//! Periodic sampling into the agent's metric store

use super::system::{Reading, SystemSampler};
use crate::core::metrics::{MetricStore, MetricValue};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const POLL_COUNT: &str = "PollCount";
pub const RANDOM_VALUE: &str = "RandomValue";

/// Writes process and host statistics into the store on every poll
#[derive(Debug, Clone)]
pub struct Snapshotter {
    store: Arc<MetricStore>,
    sampler: Arc<SystemSampler>,
    poll_interval: Duration,
}

impl Snapshotter {
    pub fn new(store: Arc<MetricStore>, sampler: Arc<SystemSampler>, poll_interval: Duration) -> Self {
        Self {
            store,
            sampler,
            poll_interval,
        }
    }

    /// One process poll: process statistics, `PollCount` and `RandomValue`
    pub fn poll_process(&self) -> Result<()> {
        let readings = self.sampler.sample_process();
        self.record(readings);

        self.store.collect_value(POLL_COUNT, MetricValue::Counter(1))?;
        self.store
            .collect_value(RANDOM_VALUE, MetricValue::Gauge(rand::random::<f64>()))?;
        Ok(())
    }

    /// One host poll
    pub fn poll_host(&self) -> Result<()> {
        let readings = self.sampler.sample_host();
        self.record(readings);
        Ok(())
    }

    fn record(&self, readings: Vec<Reading>) {
        for (name, value) in readings {
            if !value.is_finite() || value < 0.0 {
                debug!("Skipping reading {} = {}", name, value);
                continue;
            }
            if let Err(e) = self.store.collect_value(&name, MetricValue::Gauge(value)) {
                warn!("Failed to record {}: {}", name, e);
            }
        }
    }

    /// Process loop; returns once `cancel` fires
    pub async fn run_process_loop(&self, cancel: CancellationToken) {
        info!("Process sampling every {:?}", self.poll_interval);
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.poll_process() {
                        warn!("Process poll failed: {}", e);
                    }
                }
            }
        }
        debug!("Process sampling stopped");
    }

    /// Host loop; returns once `cancel` fires
    pub async fn run_host_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.poll_host() {
                        warn!("Host poll failed: {}", e);
                    }
                }
            }
        }
        debug!("Host sampling stopped");
    }
}
