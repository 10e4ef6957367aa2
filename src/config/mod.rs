//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional YAML or JSON
//! file, then command line flags and environment variables.

pub mod cli;
pub mod models;

pub use cli::{AgentArgs, ServerArgs};
pub use models::*;

use crate::utils::error::{MetricsError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Read a YAML or JSON configuration file, chosen by extension
pub async fn read_config_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MetricsError::Config(format!("Failed to read config file: {}", e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .map_err(|e| MetricsError::Config(format!("Failed to parse config: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| MetricsError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Complete configuration of the ingestion server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerSettings {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Self = read_config_file(path).await?;
        settings.validate()?;
        debug!("Configuration loaded successfully");
        Ok(settings)
    }

    /// Resolve the full layering for the given command line
    pub async fn load(args: ServerArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => read_config_file(path).await?,
            None => Self::default(),
        };
        let settings = args.apply(base);
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating server configuration");

        self.server
            .validate()
            .map_err(|e| MetricsError::Config(format!("Server config error: {}", e)))?;
        self.storage
            .validate()
            .map_err(|e| MetricsError::Config(format!("Storage config error: {}", e)))?;
        self.security
            .validate()
            .map_err(|e| MetricsError::Config(format!("Security config error: {}", e)))?;

        Ok(())
    }
}

/// Complete configuration of the metrics agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentSettings {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Self = read_config_file(path).await?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve the full layering for the given command line
    pub async fn load(args: AgentArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => read_config_file(path).await?,
            None => Self::default(),
        };
        let settings = args.apply(base);
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating agent configuration");

        self.agent
            .validate()
            .map_err(|e| MetricsError::Config(format!("Agent config error: {}", e)))?;
        self.security
            .validate()
            .map_err(|e| MetricsError::Config(format!("Security config error: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_server_settings_from_yaml() {
        let config_content = r#"
server:
  address: "0.0.0.0:9000"
  store_interval: 0
storage:
  file_storage_path: "/var/lib/metrics.json"
security:
  key: "secret"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let settings = ServerSettings::from_file(temp_file.path()).await.unwrap();
        assert_eq!(settings.server.address, "0.0.0.0:9000");
        assert!(settings.server.is_synchronous_store());
        assert!(settings.server.restore);
        assert_eq!(settings.storage.file_storage_path, "/var/lib/metrics.json");
        assert_eq!(settings.security.signing_key(), Some("secret"));
    }

    #[tokio::test]
    async fn test_agent_settings_from_json() {
        let config_content = r#"{"agent": {"address": "localhost:8080", "rate_limit": 4}}"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let settings = AgentSettings::from_file(temp_file.path()).await.unwrap();
        assert_eq!(settings.agent.rate_limit, 4);
        assert_eq!(settings.agent.report_interval, 5);
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(b"agent: [unclosed").unwrap();

        let result = AgentSettings::from_file(temp_file.path()).await;
        assert!(matches!(result, Err(MetricsError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let result = ServerSettings::from_file("/nonexistent/server.yaml").await;
        assert!(matches!(result, Err(MetricsError::Config(_))));
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(ServerSettings::default().validate().is_ok());
        assert!(AgentSettings::default().validate().is_ok());
    }
}
