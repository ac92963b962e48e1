//! MongoDB connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// Default values
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 27017;
const DEFAULT_DATABASE: &str = "files_manager";
const DEFAULT_APP_NAME: &str = "fman-mongo";
const DEFAULT_SERVER_SELECTION_TIMEOUT_SECS: u64 = 5;

/// Configuration for the MongoDB connection with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MongoConfig {
    /// MongoDB server host name or address
    #[cfg_attr(
        feature = "config",
        arg(long = "db-host", env = "DB_HOST", default_value = DEFAULT_HOST)
    )]
    pub db_host: String,

    /// MongoDB server port
    #[cfg_attr(
        feature = "config",
        arg(long = "db-port", env = "DB_PORT", default_value_t = DEFAULT_PORT)
    )]
    pub db_port: u16,

    /// Name of the database holding the `users` and `files` collections
    #[cfg_attr(
        feature = "config",
        arg(long = "db-database", env = "DB_DATABASE", default_value = DEFAULT_DATABASE)
    )]
    pub db_database: String,

    /// Server selection timeout in seconds (optional)
    ///
    /// Bounds both the startup handshake and every later operation.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "db-server-selection-timeout",
            env = "DB_SERVER_SELECTION_TIMEOUT_SECS"
        )
    )]
    pub db_server_selection_timeout: Option<u64>,
}

impl MongoConfig {
    /// Create a new configuration for the given host, port and database.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            db_host: host.into(),
            db_port: port,
            db_database: database.into(),
            db_server_selection_timeout: None,
        }
    }

    /// Returns the connection string in `mongodb://host:port` form.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.db_host, self.db_port)
    }

    /// Returns the database name.
    #[inline]
    pub fn database(&self) -> &str {
        &self.db_database
    }

    /// Returns the application name reported to the server.
    #[inline]
    pub fn app_name(&self) -> &str {
        DEFAULT_APP_NAME
    }

    /// Returns the server selection timeout, using the default if not set.
    #[inline]
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.db_server_selection_timeout
                .unwrap_or(DEFAULT_SERVER_SELECTION_TIMEOUT_SECS),
        )
    }

    /// Set the server host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.db_host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.db_port = port;
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.db_database = database.into();
        self
    }

    /// Set the server selection timeout in seconds.
    #[must_use]
    pub fn with_server_selection_timeout_secs(mut self, secs: u64) -> Self {
        self.db_server_selection_timeout = Some(secs);
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        if self.db_host.trim().is_empty() {
            return Err(Error::invalid_config("MongoDB host cannot be empty"));
        }

        if self.db_port == 0 {
            return Err(Error::invalid_config("MongoDB port cannot be zero"));
        }

        if self.db_database.trim().is_empty() {
            return Err(Error::invalid_config("Database name cannot be empty"));
        }

        // MongoDB rejects these characters in database names.
        if let Some(invalid) = self
            .db_database
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '.' | ' ' | '"' | '$'))
        {
            return Err(Error::invalid_config(format!(
                "Database name contains invalid character '{invalid}'"
            )));
        }

        if self.db_server_selection_timeout == Some(0) {
            return Err(Error::invalid_config(
                "Server selection timeout must be at least 1 second",
            ));
        }

        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_DATABASE)
    }
}
