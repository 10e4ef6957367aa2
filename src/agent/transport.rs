//! HTTP delivery to the ingestion server

use crate::core::codec::{MessageSealer, SealedMessage};
use crate::core::metrics::Envelope;
use crate::core::security::HASH_HEADER;
use crate::utils::error::{MetricsError, Result, RetryPolicy};
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// Posts sealed metric messages with retries
///
/// `Accept-Encoding: gzip` is added by the client, which also inflates
/// compressed answers.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    sealer: MessageSealer,
    real_ip: Option<IpAddr>,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(
        base_url: impl Into<String>,
        sealer: MessageSealer,
        real_ip: Option<IpAddr>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| MetricsError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sealer,
            real_ip,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /updates/` with every envelope, returning the merged values
    pub async fn send_batch(&self, envelopes: &[Envelope]) -> Result<Vec<Envelope>> {
        let payload = serde_json::to_vec(envelopes)?;
        let body = self.post("/updates/", &payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST /update/` with one envelope, returning the merged value
    pub async fn send_one(&self, envelope: &Envelope) -> Result<Envelope> {
        let payload = serde_json::to_vec(envelope)?;
        let body = self.post("/update/", &payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Seal once, then retry the same bytes under one idempotency key
    async fn post(&self, path: &str, plaintext: &[u8]) -> Result<Bytes> {
        let message = self.sealer.seal(plaintext)?;
        let idempotency_key = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, path);

        self.retry
            .call_if(
                || self.attempt(&url, &message, &idempotency_key),
                MetricsError::is_transient,
            )
            .await
    }

    async fn attempt(&self, url: &str, message: &SealedMessage, idempotency_key: &str) -> Result<Bytes> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .body(message.body.clone());

        if let Some(signature) = &message.signature {
            request = request.header(HASH_HEADER, signature);
        }
        if let Some(ip) = self.real_ip {
            request = request.header(REAL_IP_HEADER, ip.to_string());
        }

        let response = request.send().await.inspect_err(|e| debug!("Request to {} failed: {}", url, e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                debug!("Server answered {} for {}", status, url);
            } else {
                warn!("Server rejected delivery to {}: {} {}", url, status, message);
            }
            return Err(MetricsError::Transport {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Local address used to reach `base_url`
///
/// Connecting a UDP socket selects a route without sending anything.
pub fn detect_local_ip(base_url: &str) -> Option<IpAddr> {
    let authority = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split('/')
        .next()?;
    let target = if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{}:80", authority)
    };

    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(target.as_str()).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
