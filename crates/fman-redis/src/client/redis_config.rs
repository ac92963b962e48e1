//! Redis connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// Default values
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Configuration for the Redis connection with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RedisConfig {
    /// Redis server host name or address
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-host", env = "REDIS_HOST", default_value = DEFAULT_HOST)
    )]
    pub redis_host: String,

    /// Redis server port
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-port", env = "REDIS_PORT", default_value_t = DEFAULT_PORT)
    )]
    pub redis_port: u16,

    /// Connection timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-connect-timeout", env = "REDIS_CONNECT_TIMEOUT_SECS")
    )]
    pub redis_connect_timeout: Option<u64>,

    /// Per-command response timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-response-timeout", env = "REDIS_RESPONSE_TIMEOUT_SECS")
    )]
    pub redis_response_timeout: Option<u64>,
}

impl RedisConfig {
    /// Create a new configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            redis_host: host.into(),
            redis_port: port,
            redis_connect_timeout: None,
            redis_response_timeout: None,
        }
    }

    /// Returns the connection URL in `redis://host:port/` form.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }

    /// Returns the connection timeout, using the default if not set.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.redis_connect_timeout
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Returns the response timeout, using the default if not set.
    #[inline]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(
            self.redis_response_timeout
                .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_SECS),
        )
    }

    /// Set the server host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.redis_host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.redis_port = port;
        self
    }

    /// Set the connection timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.redis_connect_timeout = Some(secs);
        self
    }

    /// Set the response timeout in seconds.
    #[must_use]
    pub fn with_response_timeout_secs(mut self, secs: u64) -> Self {
        self.redis_response_timeout = Some(secs);
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        if self.redis_host.trim().is_empty() {
            return Err(Error::invalid_config("Redis host cannot be empty"));
        }

        if self.redis_port == 0 {
            return Err(Error::invalid_config("Redis port cannot be zero"));
        }

        if self.redis_connect_timeout == Some(0) {
            return Err(Error::invalid_config(
                "Redis connect timeout must be at least 1 second",
            ));
        }

        if self.redis_response_timeout == Some(0) {
            return Err(Error::invalid_config(
                "Redis response timeout must be at least 1 second",
            ));
        }

        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}
