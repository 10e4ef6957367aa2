//! Metrics agent

use clap::Parser;
use metrics_relay::config::{AgentArgs, AgentSettings};
use metrics_relay::runner::AgentRunner;
use metrics_relay::utils::logging::init_tracing;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = AgentArgs::parse();

    let settings = match AgentSettings::load(args).await {
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
    info!("Reporting to {}", settings.agent.base_url());

    match AgentRunner::new(settings).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Agent failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
