//! Metric model and in-memory store

mod store;
mod types;


pub use store::MetricStore;
pub use types::{Envelope, Metric, MetricKind, MetricValue, StoredMetric};
