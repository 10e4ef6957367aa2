//! Command line and environment overrides

use super::models::{DeliveryMode, LogFormat};
use super::{AgentSettings, ServerSettings};
use crate::core::security::SignatureScheme;
use clap::Parser;
use std::path::PathBuf;

/// Metrics ingestion server
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "server", version, about = "Metrics ingestion server")]
pub struct ServerArgs {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// Persistence interval in seconds (0 = synchronous)
    #[arg(short = 'i', long, env = "STORE_INTERVAL")]
    pub store_interval: Option<u64>,

    /// Snapshot file path
    #[arg(short = 'f', long, env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// Restore saved metrics at startup
    #[arg(short = 'r', long, env = "RESTORE")]
    pub restore: Option<bool>,

    /// Database connection string
    #[arg(short = 'd', long, env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// Shared signing secret
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,

    /// Digest scheme for HashSHA256 (sha256 or hmac_sha256)
    #[arg(long, env = "SIGNATURE_SCHEME")]
    pub signature_scheme: Option<SignatureScheme>,

    /// Private key PEM file
    #[arg(long, env = "CRYPTO_KEY")]
    pub crypto_key: Option<PathBuf>,

    /// CIDR of trusted agents
    #[arg(short = 't', long, env = "TRUSTED_SUBNET")]
    pub trusted_subnet: Option<String>,

    /// Diagnostics listener address
    #[arg(long, env = "DIAGNOSTICS_ADDRESS")]
    pub diagnostics_address: Option<String>,

    /// Log format (text or json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl ServerArgs {
    /// Overlay the supplied flags on top of `settings`
    pub fn apply(self, mut settings: ServerSettings) -> ServerSettings {
        if let Some(address) = self.address {
            settings.server.address = address;
        }
        if let Some(interval) = self.store_interval {
            settings.server.store_interval = interval;
        }
        if let Some(path) = self.file_storage_path {
            settings.storage.file_storage_path = path;
        }
        if let Some(restore) = self.restore {
            settings.server.restore = restore;
        }
        if let Some(dsn) = self.database_dsn {
            settings.storage.database.dsn = Some(dsn);
        }
        if let Some(key) = self.key {
            settings.security.key = Some(key);
        }
        if let Some(scheme) = self.signature_scheme {
            settings.security.signature_scheme = scheme;
        }
        if let Some(path) = self.crypto_key {
            settings.security.crypto_key = Some(path);
        }
        if let Some(subnet) = self.trusted_subnet {
            settings.security.trusted_subnet = Some(subnet);
        }
        if let Some(address) = self.diagnostics_address {
            settings.server.diagnostics_address = Some(address);
        }
        if let Some(format) = self.log_format {
            settings.logging.format = format;
        }
        settings
    }
}

/// Metrics agent
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "agent", version, about = "Metrics collection agent")]
pub struct AgentArgs {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Ingestion server address
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// Report interval in seconds
    #[arg(short = 'r', long, env = "REPORT_INTERVAL")]
    pub report_interval: Option<u64>,

    /// Poll interval in seconds
    #[arg(short = 'p', long, env = "POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Maximum concurrent deliveries
    #[arg(short = 'l', long, env = "RATE_LIMIT")]
    pub rate_limit: Option<usize>,

    /// Shared signing secret
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,

    /// Digest scheme for HashSHA256 (sha256 or hmac_sha256)
    #[arg(long, env = "SIGNATURE_SCHEME")]
    pub signature_scheme: Option<SignatureScheme>,

    /// Public key PEM file
    #[arg(long, env = "CRYPTO_KEY")]
    pub crypto_key: Option<PathBuf>,

    /// Delivery mode (batch or per-metric)
    #[arg(long, env = "DELIVERY_MODE")]
    pub delivery_mode: Option<DeliveryMode>,

    /// Address reported in X-Real-IP
    #[arg(long, env = "REAL_IP")]
    pub real_ip: Option<String>,

    /// Log format (text or json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl AgentArgs {
    /// Overlay the supplied flags on top of `settings`
    pub fn apply(self, mut settings: AgentSettings) -> AgentSettings {
        if let Some(address) = self.address {
            settings.agent.address = address;
        }
        if let Some(interval) = self.report_interval {
            settings.agent.report_interval = interval;
        }
        if let Some(interval) = self.poll_interval {
            settings.agent.poll_interval = interval;
        }
        if let Some(limit) = self.rate_limit {
            settings.agent.rate_limit = limit;
        }
        if let Some(key) = self.key {
            settings.security.key = Some(key);
        }
        if let Some(scheme) = self.signature_scheme {
            settings.security.signature_scheme = scheme;
        }
        if let Some(path) = self.crypto_key {
            settings.security.crypto_key = Some(path);
        }
        if let Some(mode) = self.delivery_mode {
            settings.agent.delivery_mode = mode;
        }
        if let Some(ip) = self.real_ip {
            settings.agent.real_ip = Some(ip);
        }
        if let Some(format) = self.log_format {
            settings.logging.format = format;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_values() {
        let mut base = ServerSettings::default();
        base.server.address = "0.0.0.0:9000".to_string();
        base.server.store_interval = 30;

        let args = ServerArgs::try_parse_from(["server", "-a", "127.0.0.1:7000", "-i", "0"]).unwrap();
        let settings = args.apply(base);

        assert_eq!(settings.server.address, "127.0.0.1:7000");
        assert_eq!(settings.server.store_interval, 0);
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let mut base = AgentSettings::default();
        base.agent.rate_limit = 3;

        let settings = AgentArgs::default().apply(base);
        assert_eq!(settings.agent.rate_limit, 3);
    }

    #[test]
    fn test_agent_flags() {
        let args = AgentArgs::try_parse_from([
            "agent",
            "-l",
            "4",
            "-k",
            "secret",
            "--delivery-mode",
            "per-metric",
            "--signature-scheme",
            "hmac_sha256",
        ])
        .unwrap();
        let settings = args.apply(AgentSettings::default());

        assert_eq!(settings.agent.rate_limit, 4);
        assert_eq!(settings.security.signing_key(), Some("secret"));
        assert_eq!(settings.agent.delivery_mode, DeliveryMode::PerMetric);
        assert_eq!(settings.security.signature_scheme, SignatureScheme::HmacSha256);
    }

    #[test]
    fn test_restore_flag_takes_value() {
        let args = ServerArgs::try_parse_from(["server", "-r", "false"]).unwrap();
        let settings = args.apply(ServerSettings::default());
        assert!(!settings.server.restore);
    }
}
