//! Ingestion server process

use crate::config::ServerSettings;
use crate::core::codec::MessageOpener;
use crate::core::metrics::MetricStore;
use crate::core::security::{PayloadDecryptor, TrustedSubnet};
use crate::runner::lifecycle::{Lifecycle, LifecycleState};
use crate::runner::persistence::PersistenceManager;
use crate::runner::shutdown_signal;
use crate::server::{AppState, HttpServer, Receiver};
use crate::storage::{MetricsStorage, build_storage};
use crate::utils::error::{MetricsError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Runs the ingestion server from startup to a clean stop
///
/// Startup: storage, restore, listeners. On shutdown the listeners drain
/// first so that every acknowledged update is part of the final save.
pub struct ServerRunner {
    settings: ServerSettings,
    lifecycle: Lifecycle,
}

impl ServerRunner {
    pub fn new(settings: ServerSettings) -> Self {
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
        let storage = build_storage(&self.settings.storage).await?;
        self.run_with_storage(storage, shutdown).await
    }

    /// Run against an already built backend
    pub async fn run_with_storage<F>(
        self,
        storage: Arc<dyn MetricsStorage>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let config = &self.settings.server;
        let store = Arc::new(MetricStore::new());
        let persistence = Arc::new(PersistenceManager::new(
            store.clone(),
            storage,
            config.store_interval(),
        ));

        if config.restore {
            persistence.restore().await?;
        }

        let opener = build_opener(&self.settings).await?;
        let subnet = self
            .settings
            .security
            .subnet()
            .map(TrustedSubnet::parse)
            .transpose()?;
        let receiver = Arc::new(Receiver::new(
            store,
            opener,
            persistence.clone(),
            Duration::from_secs(config.replay_ttl),
            config.replay_capacity,
        ));
        let state = AppState::new(receiver, persistence.clone(), self.lifecycle.clone());

        let http = HttpServer::new(config.clone(), state, subnet);
        let server = http.bind()?;
        let diagnostics = http.bind_diagnostics()?;
        let handle = server.handle();
        let diagnostics_handle = diagnostics.as_ref().map(|server| server.handle());

        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        {
            let persistence = persistence.clone();
            let cancel = cancel.clone();
            tracker.spawn(async move { persistence.run(cancel).await });
        }
        tracker.close();

        // Listener futures start their workers when first polled and must
        // keep being polled to process stop commands.
        let diagnostics = async move {
            if let Some(diagnostics) = diagnostics {
                if let Err(e) = diagnostics.await {
                    warn!("Diagnostics listener failed: {}", e);
                }
            }
        };
        tokio::pin!(server);
        tokio::pin!(diagnostics);
        tokio::pin!(shutdown);

        self.lifecycle.advance(LifecycleState::Serving);
        info!("Server ready");

        let mut diagnostics_done = false;
        let finished = loop {
            tokio::select! {
                _ = &mut shutdown => break None,
                result = &mut server => break Some(result),
                _ = &mut diagnostics, if !diagnostics_done => diagnostics_done = true,
            }
        };

        self.lifecycle.advance(LifecycleState::Draining);
        cancel.cancel();

        let stop_server = async {
            match finished {
                Some(result) => {
                    if let Err(e) = &result {
                        error!("HTTP server failed: {}", e);
                    }
                    result
                }
                None => {
                    let (_, result) = tokio::join!(handle.stop(true), &mut server);
                    result
                }
            }
        };
        let stop_diagnostics = async {
            if let (Some(handle), false) = (diagnostics_handle, diagnostics_done) {
                tokio::join!(handle.stop(true), &mut diagnostics);
            }
        };
        let outcome = match tokio::time::timeout(config.shutdown_timeout(), async {
            tokio::join!(stop_server, stop_diagnostics).0
        })
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "HTTP listeners did not stop within {:?}",
                    config.shutdown_timeout()
                );
                Ok(())
            }
        };
        tracker.wait().await;

        match persistence.save().await {
            Ok(count) => info!("Final save wrote {} metrics", count),
            Err(e) => error!("Final save failed: {}", e),
        }

        self.lifecycle.advance(LifecycleState::Stopped);
        info!("Server stopped");
        outcome.map_err(MetricsError::from)
    }
}

async fn build_opener(settings: &ServerSettings) -> Result<MessageOpener> {
    let signer = settings.security.signer();
    let decryptor = match &settings.security.crypto_key {
        Some(path) => Some(PayloadDecryptor::from_pem_file(path).await?),
        None => None,
    };
    Ok(MessageOpener::new(
        signer,
        decryptor,
        settings.security.require_signature,
    ))
}
