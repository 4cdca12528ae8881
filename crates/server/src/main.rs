//! Citegate — a retrieval-augmented generation gateway.
//!
//! Accepts a natural-language question, fetches supporting snippets from a
//! retrieval service, assembles a grounded prompt, forwards it to an
//! OpenAI-compatible generation backend, and returns the answer annotated
//! with the citations that grounded it.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use citegate_core::{logging, GatewayConfig, Telemetry};
use citegate_generation::OpenAiCompatClient;
use citegate_retrieval::HttpRetriever;

mod answer;
mod pipeline;
mod routes;

use routes::AppState;

/// Citegate gateway server.
#[derive(Debug, Parser)]
#[command(name = "citegate", about = "RAG orchestration gateway")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Path to a YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level override (e.g. "debug", "info")
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = GatewayConfig::load().context("Failed to load configuration")?;
    if let Some(ref path) = args.config {
        config = config.merge_yaml(path).context("Failed to merge config file")?;
    }
    let config = config.with_overrides(args.bind, args.port, args.log_level);
    config.validate().context("Invalid configuration")?;

    logging::init_logging(config.log_level.as_deref()).context("Failed to initialize logging")?;

    info!(
        retriever_url = %config.retriever_url,
        generation_url = %config.generation_url,
        model_name = %config.model_name,
        max_ctx_snippets = config.max_ctx_snippets,
        max_ctx_chars = config.max_ctx_chars,
        "Configuration loaded"
    );

    let telemetry = Arc::new(Telemetry::new().context("Failed to create telemetry")?);
    let retriever = Arc::new(HttpRetriever::new(&config.retriever_url)?);
    let generator = Arc::new(OpenAiCompatClient::new(&config.generation_url)?);

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .context("Invalid bind address")?;

    let state = AppState {
        config: Arc::new(config),
        telemetry,
        retriever,
        generator,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind TCP listener")?;
    info!("Citegate listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolve when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = async {
        std::future::pending::<()>().await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
