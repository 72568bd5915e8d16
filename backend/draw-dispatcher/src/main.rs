//! Draw Dispatcher - command line entry point
//!
//! Usage: `draw-dispatcher <start_draw> <end_draw>`

use anyhow::{Context, Result};
use draw_dispatcher::{BatchDispatcher, BatchPolicy, Config, DrawRange, OrchestratorClient};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: draw-dispatcher <start_draw> <end_draw>";

/// Exactly two positional draw numbers, nothing else
fn parse_args(args: &[String]) -> Result<(u32, u32), String> {
    match args {
        [start, end] => {
            let start = start
                .parse::<u32>()
                .map_err(|_| format!("start_draw must be a positive integer, got '{start}'"))?;
            let end = end
                .parse::<u32>()
                .map_err(|_| format!("end_draw must be a positive integer, got '{end}'"))?;
            Ok((start, end))
        }
        _ => Err(format!("expected 2 arguments, got {}", args.len())),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,draw_dispatcher=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let (start, end) = match parse_args(&args) {
        Ok(range) => range,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    init_tracing();

    match run(start, end).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Draw dispatch aborted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(start: u32, end: u32) -> Result<()> {
    let range = DrawRange::new(start, end).context("Invalid draw range")?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let policy = BatchPolicy::from_config(&config).context("Configuration validation failed")?;
    info!(
        "Configuration loaded: batch_size={}, wait_seconds={}, workflow={}",
        config.batch_size, config.wait_seconds, config.workflow
    );

    let client = OrchestratorClient::new(&config).context("Failed to create orchestrator client")?;
    let dispatcher = BatchDispatcher::new(Arc::new(client), policy, config.workflow.clone());

    let report = dispatcher.run(range).await?;

    info!(
        "Dispatch finished: triggered={}, failed={}, pauses={}",
        report.triggered.len(),
        report.failures.len(),
        report.pauses
    );

    Ok(())
}
