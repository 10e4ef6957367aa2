//! Agent configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a report tick ships its metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One `POST /updates/` carrying every metric
    #[default]
    Batch,
    /// One `POST /update/` per metric
    PerMetric,
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(DeliveryMode::Batch),
            "per_metric" | "per-metric" | "single" => Ok(DeliveryMode::PerMetric),
            other => Err(format!("Unknown delivery mode: {}", other)),
        }
    }
}

/// Metrics agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Ingestion server address, with or without scheme
    #[serde(default = "default_address")]
    pub address: String,
    /// Report interval in seconds
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Maximum number of concurrent deliveries
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,
    /// Batch or per-metric delivery
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    /// Address sent as `X-Real-IP`; detected when absent
    #[serde(default)]
    pub real_ip: Option<String>,
    /// Time allowed for the final flush at shutdown, in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub drain_timeout: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            report_interval: default_report_interval(),
            poll_interval: default_poll_interval(),
            rate_limit: default_rate_limit(),
            delivery_mode: DeliveryMode::default(),
            request_timeout: default_timeout(),
            real_ip: None,
            drain_timeout: default_shutdown_timeout(),
        }
    }
}

impl AgentConfig {
    /// Base URL of the ingestion server
    pub fn base_url(&self) -> String {
        let address = self.address.trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout)
    }

    /// Validate agent configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("Address cannot be empty".to_string());
        }

        if self.report_interval == 0 {
            return Err("Report interval cannot be 0".to_string());
        }

        if self.poll_interval == 0 {
            return Err("Poll interval cannot be 0".to_string());
        }

        if self.rate_limit == 0 {
            return Err("Rate limit cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            return Err("Request timeout cannot be 0".to_string());
        }

        if let Some(ip) = &self.real_ip {
            ip.parse::<std::net::IpAddr>()
                .map_err(|e| format!("Invalid real IP '{}': {}", ip, e))?;
        }

        Ok(())
    }
}
