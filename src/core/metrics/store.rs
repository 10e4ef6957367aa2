//! In-memory metric table with merge rules

use super::types::{Envelope, Metric, MetricKind, MetricValue, StoredMetric};
use crate::utils::error::{MetricsError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Authoritative table of current metric values
///
/// Counters add every accepted delta, gauges keep the last value. A single
/// lock guards the whole table so reads of all metrics never observe a
/// half-applied update.
#[derive(Debug, Default)]
pub struct MetricStore {
    metrics: RwLock<BTreeMap<String, MetricValue>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from a persisted snapshot
    pub fn from_snapshot(records: Vec<StoredMetric>) -> Result<Self> {
        let store = Self::new();
        store.import(records)?;
        Ok(store)
    }

    /// Parse `raw` according to `kind` and merge it into the metric `id`
    pub fn collect(&self, id: &str, kind: &str, raw: &str) -> Result<Metric> {
        let kind: MetricKind = kind.parse()?;
        validate_id(id)?;
        let value = MetricValue::parse(kind, raw)?;
        self.merge(id, value)
    }

    /// Merge an already typed value into the metric `id`
    pub fn collect_value(&self, id: &str, value: MetricValue) -> Result<Metric> {
        validate_id(id)?;
        self.merge(id, value)
    }

    /// Apply a wire envelope and return the post-merge envelope
    pub fn apply(&self, envelope: &Envelope) -> Result<Envelope> {
        let value = envelope.metric_value()?;
        validate_id(&envelope.id)?;
        self.merge(&envelope.id, value).map(|m| m.to_envelope())
    }

    /// Apply a batch of envelopes as one unit
    ///
    /// Every envelope is merged against a scratch copy of the entries it
    /// touches; the table changes only when the whole batch succeeds.
    /// Returns the post-merge envelope of each entry in order.
    pub fn apply_batch(&self, envelopes: &[Envelope]) -> Result<Vec<Envelope>> {
        let mut metrics = self.metrics.write();
        let mut staged: BTreeMap<&str, MetricValue> = BTreeMap::new();
        let mut merged = Vec::with_capacity(envelopes.len());

        for envelope in envelopes {
            let value = envelope.metric_value()?;
            validate_id(&envelope.id)?;
            let current = staged
                .get(envelope.id.as_str())
                .or_else(|| metrics.get(&envelope.id))
                .copied();
            let next = merge_value(&envelope.id, current, value)?;
            staged.insert(envelope.id.as_str(), next);
            merged.push(Metric::new(envelope.id.as_str(), next).to_envelope());
        }

        for (id, value) in staged {
            metrics.insert(id.to_string(), value);
        }
        Ok(merged)
    }

    /// Current value of `id`
    pub fn get(&self, id: &str) -> Result<Metric> {
        self.metrics
            .read()
            .get(id)
            .map(|value| Metric::new(id, *value))
            .ok_or_else(|| MetricsError::not_found(format!("metric '{}' not found", id)))
    }

    /// Current value of `id`, which must be of `kind`
    pub fn get_typed(&self, kind: &str, id: &str) -> Result<Metric> {
        let kind: MetricKind = kind.parse()?;
        let metric = self.get(id)?;
        if metric.kind() != kind {
            return Err(MetricsError::not_found(format!(
                "{} '{}' not found",
                kind, id
            )));
        }
        Ok(metric)
    }

    /// Canonical JSON envelope of `id`
    pub fn envelope(&self, id: &str) -> Result<String> {
        let envelope = self.get(id)?.to_envelope();
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Metric ids in lexicographic order
    pub fn list(&self) -> Vec<String> {
        self.metrics.read().keys().cloned().collect()
    }

    /// Every metric in lexicographic order
    pub fn snapshot(&self) -> Vec<Metric> {
        self.metrics
            .read()
            .iter()
            .map(|(id, value)| Metric::new(id.clone(), *value))
            .collect()
    }

    /// Whole-state copy for persistence
    pub fn export(&self) -> Vec<StoredMetric> {
        self.metrics
            .read()
            .iter()
            .map(|(id, value)| StoredMetric::from(&Metric::new(id.clone(), *value)))
            .collect()
    }

    /// Replace the whole state; nothing changes unless every record is valid
    pub fn import(&self, records: Vec<StoredMetric>) -> Result<()> {
        let mut table = BTreeMap::new();
        for record in records {
            let metric = Metric::try_from(record)?;
            table.insert(metric.id, metric.value);
        }
        *self.metrics.write() = table;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    fn merge(&self, id: &str, value: MetricValue) -> Result<Metric> {
        let mut metrics = self.metrics.write();
        let merged = merge_value(id, metrics.get(id).copied(), value)?;
        metrics.insert(id.to_string(), merged);

        Ok(Metric::new(id, merged))
    }
}

/// Counters add, gauges replace, the kind never changes
fn merge_value(id: &str, current: Option<MetricValue>, value: MetricValue) -> Result<MetricValue> {
    value.validate()?;

    match (current, value) {
        (None, value) => Ok(value),
        (Some(MetricValue::Counter(total)), MetricValue::Counter(delta)) => total
            .checked_add(delta)
            .map(MetricValue::Counter)
            .ok_or_else(|| MetricsError::bad_request(format!("counter '{}' would overflow", id))),
        (Some(MetricValue::Gauge(_)), MetricValue::Gauge(value)) => Ok(MetricValue::Gauge(value)),
        (Some(existing), value) => Err(MetricsError::bad_request(format!(
            "metric '{}' is a {}, not a {}",
            id,
            existing.kind(),
            value.kind()
        ))),
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(MetricsError::bad_request("metric id must not be empty"));
    }
    Ok(())
}
