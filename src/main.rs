//! Metrics ingestion server

use clap::Parser;
use metrics_relay::config::{ServerArgs, ServerSettings};
use metrics_relay::runner::ServerRunner;
use metrics_relay::utils::logging::init_tracing;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = ServerArgs::parse();

    let settings = match ServerSettings::load(args).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&settings.logging) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    info!(
        "Starting {} {} on {}",
        metrics_relay::NAME,
        metrics_relay::VERSION,
        settings.server.address
    );

    match ServerRunner::new(settings).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
