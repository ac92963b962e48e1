//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig     # Host, port, timeouts
//! └── service: ServiceConfig   # Redis and MongoDB connections
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
use fman_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "fman")]
#[command(about = "Files-manager status and stats server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[command(flatten)]
    pub server: ServerConfig,

    /// Backing store configuration (Redis cache, MongoDB document store).
    #[command(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap's `env` fallbacks can see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid backing store configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();

        let redis = &self.service.redis;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            url = %redis.url(),
            connect_timeout_secs = redis.connect_timeout().as_secs(),
            response_timeout_secs = redis.response_timeout().as_secs(),
            "Redis configuration"
        );

        let mongo = &self.service.mongo;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            uri = %mongo.uri(),
            database = mongo.database(),
            server_selection_timeout_secs = mongo.server_selection_timeout().as_secs(),
            "MongoDB configuration"
        );
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting fman server"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
