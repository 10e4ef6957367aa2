// Module declarations
mod connection;
mod metric_ops;
mod types;


// Re-export public types
pub use types::{DatabaseBackendType, DatabaseStorage};
