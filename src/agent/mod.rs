//! Metrics agent
//!
//! The agent samples process and host statistics into a local
//! [`MetricStore`](crate::core::metrics::MetricStore) and periodically ships
//! them to the ingestion server.

pub mod ledger;
pub mod sender;
pub mod snapshot;
pub mod system;
pub mod transport;

pub use ledger::{CounterLedger, Reservation};
pub use sender::{Dispatch, Sender};
pub use snapshot::Snapshotter;
pub use system::SystemSampler;
pub use transport::{Transport, detect_local_ip};
