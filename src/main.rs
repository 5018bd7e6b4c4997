//! Loan worker - main entry point
//!
//! Loads configuration, wires the REST workflow client and rate source into
//! the engine, and serves the webhook endpoint until SIGINT/SIGTERM.

use clap::{Parser, Subcommand};
use loan_worker::config::WorkerConfig;
use loan_worker::currency::{CurrencyConverter, HttpRateSource};
use loan_worker::engine::LoanWorkflowEngine;
use loan_worker::observability::init_default_logging;
use loan_worker::webhook::WebhookDispatcher;
use loan_worker::workflow::{RestWorkflowClient, RestWorkflowClientConfig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Webhook worker automating the loan approval workflow
#[derive(Parser)]
#[command(name = "loan-worker")]
#[command(about = "Webhook worker automating a loan approval workflow")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the worker
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting loan worker v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_worker(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Worker shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<WorkerConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(WorkerConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["loan-worker.toml", "config/loan-worker.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(WorkerConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create loan-worker.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_worker(config: WorkerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Arc::new(build_dispatcher(&config)?);
    let port = config.server.port;

    // Graceful shutdown on SIGINT/SIGTERM
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    loan_worker::server::serve(dispatcher, port, shutdown).await;

    info!("Worker shutdown initiated");
    Ok(())
}

/// Bootstrap factory - wires the external collaborators into the dispatcher
fn build_dispatcher(
    config: &WorkerConfig,
) -> Result<WebhookDispatcher<RestWorkflowClient, HttpRateSource>, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(config.http.timeout_secs);

    let backend = RestWorkflowClient::new(RestWorkflowClientConfig {
        endpoint: config.backend.endpoint.clone(),
        application_id: config.backend.application_id.clone(),
        token: config.get_backend_token()?,
        timeout,
    })?;

    let rate_source = HttpRateSource::new(config.currency.rate_endpoint.clone(), timeout)?;
    let converter = CurrencyConverter::new(config.currency.codes.clone(), rate_source);

    Ok(WebhookDispatcher::new(LoanWorkflowEngine::new(
        backend, converter,
    )))
}

fn handle_config_command(
    config: WorkerConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
