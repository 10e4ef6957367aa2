use crate::config::DatabaseConfig;
use crate::utils::error::{MetricsError, Result, RetryConfig, RetryPolicy};
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::super::migration::Migrator;
use super::types::{DatabaseBackendType, DatabaseStorage};

impl DatabaseStorage {
    /// Open a connection pool for `dsn`
    pub async fn connect(dsn: &str, config: &DatabaseConfig) -> Result<Self> {
        let backend_type = DatabaseBackendType::from_dsn(dsn);
        let in_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");

        let mut opt = ConnectOptions::new(dsn.to_string());
        opt.connect_timeout(config.connection_timeout())
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        if in_memory {
            // Every pooled connection would see its own empty database
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(config.max_connections)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(3600));
        }

        let db = Database::connect(opt)
            .await
            .map_err(MetricsError::Database)?;
        info!("Database connection established ({:?})", backend_type);

        Ok(Self {
            db,
            backend_type,
            retry: RetryPolicy::new(RetryConfig::database()),
        })
    }

    /// Get the current backend type
    pub fn backend_type(&self) -> DatabaseBackendType {
        self.backend_type
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            MetricsError::Database(e)
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");
        self.db.ping().await.map_err(MetricsError::Database)?;
        debug!("Database health check passed");
        Ok(())
    }
}
