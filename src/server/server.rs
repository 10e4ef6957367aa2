//! HTTP listeners
//!
//! The ingestion listener serves the metric routes; the optional diagnostics
//! listener serves `/debug/status` on a separate address.

use crate::config::ServerConfig;
use crate::core::security::TrustedSubnet;
use crate::server::middleware::TrustedSubnetMiddleware;
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{MetricsError, Result};
use actix_web::dev::Server;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::Compress, web};
use std::io::ErrorKind;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
    subnet: Option<TrustedSubnet>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState, subnet: Option<TrustedSubnet>) -> Self {
        Self {
            config,
            state,
            subnet,
        }
    }

    /// Create the ingestion application
    pub fn create_app(
        state: web::Data<AppState>,
        subnet: Option<TrustedSubnet>,
        max_body_size: usize,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(state)
            .app_data(web::PayloadConfig::new(max_body_size))
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .wrap(TrustedSubnetMiddleware::new(subnet))
            .wrap(Compress::default())
            .wrap(TracingLogger::default())
            .configure(routes::configure_routes)
    }

    /// Create the diagnostics application
    pub fn create_diagnostics_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(state)
            .wrap(TracingLogger::default())
            .configure(routes::diagnostics::configure_routes)
    }

    /// Bind the ingestion listener
    ///
    /// Signal handling is left to the caller, which stops the returned
    /// server through its handle.
    pub fn bind(&self) -> Result<Server> {
        let address = self.config.address.as_str();
        let state = web::Data::new(self.state.clone());
        let subnet = self.subnet;
        let max_body_size = self.config.max_body_size;

        let server = ActixHttpServer::new(move || {
            Self::create_app(state.clone(), subnet, max_body_size)
        })
        .workers(self.config.worker_count())
        .shutdown_timeout(self.config.shutdown_timeout)
        .disable_signals()
        .bind(address)
        .map_err(|e| format_bind_error(e, address))?
        .run();

        info!("HTTP server listening on {}", address);
        Ok(server)
    }

    /// Bind the diagnostics listener when an address is configured
    pub fn bind_diagnostics(&self) -> Result<Option<Server>> {
        let Some(address) = self.config.diagnostics_address.as_deref() else {
            return Ok(None);
        };
        let state = web::Data::new(self.state.clone());

        let server = ActixHttpServer::new(move || Self::create_diagnostics_app(state.clone()))
            .workers(1)
            .shutdown_timeout(self.config.shutdown_timeout)
            .disable_signals()
            .bind(address)
            .map_err(|e| format_bind_error(e, address))?
            .run();

        info!("Diagnostics listening on {}", address);
        Ok(Some(server))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Format a readable message for listener bind failures
pub(crate) fn format_bind_error(error: std::io::Error, address: &str) -> MetricsError {
    match error.kind() {
        ErrorKind::AddrInUse => MetricsError::internal(format!(
            "Address {} is already in use; stop the other process or pass a different -a/ADDRESS",
            address
        )),
        ErrorKind::PermissionDenied => MetricsError::internal(format!(
            "Permission denied binding {}; use a port >= 1024",
            address
        )),
        _ => MetricsError::internal(format!("Failed to bind to {}: {}", address, error)),
    }
}
