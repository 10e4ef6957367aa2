//! Metrics agent process

use crate::agent::{Sender, Snapshotter, SystemSampler, Transport, detect_local_ip};
use crate::config::AgentSettings;
use crate::core::codec::MessageSealer;
use crate::core::metrics::MetricStore;
use crate::core::security::PayloadEncryptor;
use crate::runner::lifecycle::{Lifecycle, LifecycleState};
use crate::runner::shutdown_signal;
use crate::utils::error::{MetricsError, Result, RetryConfig, RetryPolicy};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Runs the sampling and reporting loops until shutdown, then flushes once
pub struct AgentRunner {
    settings: AgentSettings,
    lifecycle: Lifecycle,
}

impl AgentRunner {
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            settings,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let config = &self.settings.agent;
        let cancel = CancellationToken::new();

        let store = Arc::new(MetricStore::new());
        let snapshotter = Snapshotter::new(
            store.clone(),
            Arc::new(SystemSampler::new()),
            config.poll_interval(),
        );
        let transport = self.build_transport(&cancel).await?;
        let sender = Sender::new(
            store,
            Arc::new(transport),
            config.rate_limit,
            config.delivery_mode,
        );

        let tracker = TaskTracker::new();
        {
            let snapshotter = snapshotter.clone();
            let cancel = cancel.clone();
            tracker.spawn(async move { snapshotter.run_process_loop(cancel).await });
        }
        {
            let cancel = cancel.clone();
            tracker.spawn(async move { snapshotter.run_host_loop(cancel).await });
        }
        {
            let sender = sender.clone();
            let cancel = cancel.clone();
            let report_interval = config.report_interval();
            tracker.spawn(async move { sender.run(report_interval, cancel).await });
        }
        tracker.close();

        self.lifecycle.advance(LifecycleState::Serving);
        info!("Agent started");

        shutdown.await;

        self.lifecycle.advance(LifecycleState::Draining);
        cancel.cancel();
        tracker.wait().await;

        match tokio::time::timeout(config.drain_timeout(), sender.flush()).await {
            Ok(Ok(count)) => info!("Final flush delivered {} metrics", count),
            Ok(Err(e)) => warn!("Final flush failed: {}", e),
            Err(_) => warn!(
                "Final flush did not finish within {:?}",
                config.drain_timeout()
            ),
        }

        self.lifecycle.advance(LifecycleState::Stopped);
        info!("Agent stopped");
        Ok(())
    }

    async fn build_transport(&self, cancel: &CancellationToken) -> Result<Transport> {
        let config = &self.settings.agent;
        let security = &self.settings.security;

        let signer = security.signer();
        let encryptor = match &security.crypto_key {
            Some(path) => Some(PayloadEncryptor::from_pem_file(path).await?),
            None => None,
        };

        let base_url = config.base_url();
        let real_ip = match config.real_ip.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => Some(ip.parse::<IpAddr>().map_err(|e| {
                MetricsError::config(format!("Invalid real IP '{}': {}", ip, e))
            })?),
            _ => detect_local_ip(&base_url),
        };

        Transport::new(
            base_url,
            MessageSealer::new(signer, encryptor),
            real_ip,
            RetryPolicy::new(RetryConfig::delivery()).with_cancellation(cancel.clone()),
            config.request_timeout(),
        )
    }
}
