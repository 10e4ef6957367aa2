//! Metric data types

use crate::utils::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a metric, fixed at its first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Cumulative integer sum
    Counter,
    /// Last written floating point value
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            other => Err(MetricsError::not_implemented(format!(
                "unknown metric type '{}'",
                other
            ))),
        }
    }
}

/// Current value of a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Counter(i64),
    Gauge(f64),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter(_) => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Parse the textual form used by the URL update route
    pub fn parse(kind: MetricKind, raw: &str) -> Result<Self> {
        match kind {
            MetricKind::Counter => raw
                .trim()
                .parse::<i64>()
                .map(MetricValue::Counter)
                .map_err(|_| MetricsError::bad_request(format!("invalid counter value '{}'", raw))),
            MetricKind::Gauge => raw
                .trim()
                .parse::<f64>()
                .map(MetricValue::Gauge)
                .map_err(|_| MetricsError::bad_request(format!("invalid gauge value '{}'", raw))),
        }
    }

    /// Reject values no metric may ever hold
    pub fn validate(&self) -> Result<()> {
        match *self {
            MetricValue::Counter(delta) if delta < 0 => Err(MetricsError::bad_request(format!(
                "counter value must not be negative, got {}",
                delta
            ))),
            MetricValue::Gauge(value) if !value.is_finite() => Err(MetricsError::bad_request(
                format!("gauge value must be finite, got {}", value),
            )),
            MetricValue::Gauge(value) if value < 0.0 => Err(MetricsError::bad_request(format!(
                "gauge value must not be negative, got {}",
                value
            ))),
            _ => Ok(()),
        }
    }
}

/// Integer text for counters, shortest round-trip decimal for gauges
impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Counter(v) => write!(f, "{}", v),
            MetricValue::Gauge(v) => write!(f, "{}", v),
        }
    }
}

/// A named metric and its current value
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub id: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(id: impl Into<String>, value: MetricValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.value.kind()
    }

    /// Canonical text representation of the value
    pub fn text(&self) -> String {
        self.value.to_string()
    }

    pub fn to_envelope(&self) -> Envelope {
        match self.value {
            MetricValue::Counter(total) => Envelope::counter(&self.id, total),
            MetricValue::Gauge(value) => Envelope::gauge(&self.id, value),
        }
    }
}

/// Wire message for the JSON routes
///
/// `type` stays free text so an unknown kind is reported as not implemented
/// rather than as a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub mtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Envelope {
    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            mtype: MetricKind::Counter.to_string(),
            delta: Some(delta),
            value: None,
        }
    }

    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            mtype: MetricKind::Gauge.to_string(),
            delta: None,
            value: Some(value),
        }
    }

    /// Kind and value carried by the envelope
    pub fn metric_value(&self) -> Result<MetricValue> {
        let kind: MetricKind = self.mtype.parse()?;
        match kind {
            MetricKind::Counter => self.delta.map(MetricValue::Counter).ok_or_else(|| {
                MetricsError::bad_request(format!("counter '{}' has no delta", self.id))
            }),
            MetricKind::Gauge => self.value.map(MetricValue::Gauge).ok_or_else(|| {
                MetricsError::bad_request(format!("gauge '{}' has no value", self.id))
            }),
        }
    }
}

/// Persistence record for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetric {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
}

impl From<&Metric> for StoredMetric {
    fn from(metric: &Metric) -> Self {
        let (counter_value, gauge_value) = match metric.value {
            MetricValue::Counter(v) => (Some(v), None),
            MetricValue::Gauge(v) => (None, Some(v)),
        };
        Self {
            id: metric.id.clone(),
            kind: metric.kind(),
            counter_value,
            gauge_value,
            text_value: Some(metric.text()),
        }
    }
}

impl TryFrom<StoredMetric> for Metric {
    type Error = MetricsError;

    fn try_from(stored: StoredMetric) -> Result<Self> {
        if stored.id.is_empty() {
            return Err(MetricsError::bad_request("stored metric has an empty id"));
        }
        let value = match stored.kind {
            MetricKind::Counter => stored.counter_value.map(MetricValue::Counter),
            MetricKind::Gauge => stored.gauge_value.map(MetricValue::Gauge),
        };
        let value = match (value, stored.text_value.as_deref()) {
            (Some(value), _) => value,
            (None, Some(text)) => MetricValue::parse(stored.kind, text)?,
            (None, None) => {
                return Err(MetricsError::bad_request(format!(
                    "stored metric '{}' has no value",
                    stored.id
                )));
            }
        };
        value.validate()?;
        Ok(Metric::new(stored.id, value))
    }
}
