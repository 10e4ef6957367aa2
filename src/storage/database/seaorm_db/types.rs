use crate::utils::error::RetryPolicy;
use sea_orm::DatabaseConnection;

/// SeaORM-based metrics backend
#[derive(Debug)]
pub struct DatabaseStorage {
    pub(super) db: DatabaseConnection,
    /// Backend type indicator
    pub(super) backend_type: DatabaseBackendType,
    /// Retry schedule for writes
    pub(super) retry: RetryPolicy,
}

/// Database backend type indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    PostgreSQL,
    SQLite,
}

impl DatabaseBackendType {
    pub fn from_dsn(dsn: &str) -> Self {
        if dsn.starts_with("sqlite") {
            DatabaseBackendType::SQLite
        } else {
            DatabaseBackendType::PostgreSQL
        }
    }
}
