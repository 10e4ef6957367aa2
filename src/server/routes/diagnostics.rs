//! Diagnostics endpoint served on its own listener

use crate::BuildInfo;
use crate::runner::lifecycle::LifecycleState;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use std::collections::BTreeMap;

/// Configure diagnostics routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/debug").route("/status", web::get().to(status)));
}

/// Snapshot of the server's internal state
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: LifecycleState,
    pub uptime_seconds: u64,
    pub metrics: usize,
    pub storage: &'static str,
    pub build: BuildInfo,
    /// Process memory readings, bytes
    pub memory: BTreeMap<String, f64>,
}

/// `GET /debug/status`
pub async fn status(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let memory = state
        .sampler
        .sample_process()
        .into_iter()
        .filter(|(name, _)| name.ends_with("Memory"))
        .collect();

    let report = StatusReport {
        state: state.lifecycle.state(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        metrics: state.store.len(),
        storage: state.storage().name(),
        build: BuildInfo::current(),
        memory,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}
