//! Rate-limited delivery of store snapshots

use super::ledger::{CounterLedger, Reservation};
use super::transport::Transport;
use crate::config::DeliveryMode;
use crate::core::metrics::{Envelope, Metric, MetricStore, MetricValue};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Result of a report tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A delivery task was started
    Started,
    /// Every permit was in use; nothing was sent
    Skipped,
}

/// Ships the agent store to the server, at most `rate_limit` deliveries at a time
#[derive(Debug, Clone)]
pub struct Sender {
    store: Arc<MetricStore>,
    ledger: Arc<CounterLedger>,
    transport: Arc<Transport>,
    limiter: Arc<Semaphore>,
    mode: DeliveryMode,
}

impl Sender {
    pub fn new(
        store: Arc<MetricStore>,
        transport: Arc<Transport>,
        rate_limit: usize,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            store,
            ledger: Arc::new(CounterLedger::new()),
            transport,
            limiter: Arc::new(Semaphore::new(rate_limit.max(1))),
            mode,
        }
    }

    pub fn ledger(&self) -> &Arc<CounterLedger> {
        &self.ledger
    }

    /// Deliveries currently in flight
    pub fn in_flight(&self, rate_limit: usize) -> usize {
        rate_limit.saturating_sub(self.limiter.available_permits())
    }

    /// Start one delivery if a permit is free
    pub fn dispatch(&self, tracker: &TaskTracker, cancel: &CancellationToken) -> Dispatch {
        let permit = match self.limiter.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("All delivery slots busy, skipping report tick");
                return Dispatch::Skipped;
            }
        };

        let sender = self.clone();
        let cancel = cancel.clone();
        tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => debug!("Delivery cancelled"),
                result = sender.deliver_with(permit) => match result {
                    Ok(0) => debug!("Nothing to report"),
                    Ok(n) => debug!("Delivered {} metrics", n),
                    Err(e) => warn!("Delivery failed: {}", e),
                },
            }
        });
        Dispatch::Started
    }

    /// Deliver now, waiting for a free permit
    pub async fn flush(&self) -> Result<usize> {
        let Ok(permit) = self.limiter.clone().acquire_owned().await else {
            return Ok(0);
        };
        self.deliver_with(permit).await
    }

    /// Snapshot the store and deliver it; the permit is held until this returns
    async fn deliver_with(&self, _permit: OwnedSemaphorePermit) -> Result<usize> {
        let metrics = self.store.snapshot();
        let reservation = self.ledger.reserve(&metrics);
        self.deliver(&metrics, reservation).await
    }

    async fn deliver(&self, metrics: &[Metric], mut reservation: Reservation) -> Result<usize> {
        let envelopes = build_envelopes(metrics, &reservation);
        if envelopes.is_empty() {
            return Ok(0);
        }

        match self.mode {
            DeliveryMode::Batch => {
                self.transport.send_batch(&envelopes).await?;
                reservation.acknowledge_all();
            }
            DeliveryMode::PerMetric => {
                // Fail fast; dropping the reservation returns what was not sent
                for envelope in &envelopes {
                    self.transport.send_one(envelope).await?;
                    reservation.acknowledge(&envelope.id);
                }
            }
        }
        Ok(envelopes.len())
    }

    /// Report loop; returns once `cancel` fires and in-flight deliveries ended
    pub async fn run(&self, report_interval: Duration, cancel: CancellationToken) {
        info!(
            "Reporting to {} every {:?} ({:?})",
            self.transport.base_url(),
            report_interval,
            self.mode
        );
        let tracker = TaskTracker::new();
        let mut interval = tokio::time::interval_at(Instant::now() + report_interval, report_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.dispatch(&tracker, &cancel);
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        debug!("Report loop stopped");
    }
}

/// Counters carry their reserved delta, gauges their current value
fn build_envelopes(metrics: &[Metric], reservation: &Reservation) -> Vec<Envelope> {
    metrics
        .iter()
        .filter_map(|metric| match metric.value {
            MetricValue::Counter(_) => reservation
                .delta(&metric.id)
                .map(|delta| Envelope::counter(&metric.id, delta)),
            MetricValue::Gauge(value) => Some(Envelope::gauge(&metric.id, value)),
        })
        .collect()
}
