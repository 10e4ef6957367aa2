//! Storage configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persistence backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file location, used when no database is configured
    #[serde(default = "default_file_storage_path")]
    pub file_storage_path: String,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_storage_path: default_file_storage_path(),
            database: DatabaseConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Whether the relational backend is selected
    pub fn uses_database(&self) -> bool {
        self.database.dsn().is_some()
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.uses_database() && self.file_storage_path.trim().is_empty() {
            return Err("Either a database DSN or a file storage path is required".to_string());
        }
        self.database.validate()
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; wins over the file backend when set
    #[serde(default)]
    pub dsn: Option<String>,
    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Connection string, ignoring an empty value
    pub fn dsn(&self) -> Option<&str> {
        self.dsn.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("Max connections cannot be 0".to_string());
        }
        Ok(())
    }
}
