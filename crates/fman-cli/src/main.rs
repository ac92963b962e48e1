#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;

use std::process;

use axum::Router;
use fman_server::handler::routes;
use fman_server::middleware::{RouterObservabilityExt, RouterRecoveryExt};
use fman_server::service::{ServiceState, StatusReporter};

use crate::config::{Cli, ServerConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "fman_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "fman_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "fman_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service);
    tokio::spawn(log_store_status(state.status_reporter.clone()));

    let router = create_router(state, &cli.server);
    server::serve(router, cli.server).await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, server: &ServerConfig) -> Router {
    routes()
        .with_state(state)
        .with_observability()
        .with_recovery(&server.recovery_config())
}

/// Logs the outcome of both store handshakes once they resolve.
async fn log_store_status(status_reporter: StatusReporter) {
    let status = status_reporter.wait_resolved().await;

    if status.cache_alive && status.store_alive {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            redis = status.cache_alive,
            db = status.store_alive,
            "backing stores connected"
        );
    } else {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            redis = status.cache_alive,
            db = status.store_alive,
            "serving with unavailable backing stores"
        );
    }
}
