//! Error types and utilities for Redis operations.

/// Result type for all Redis operations in this crate.
///
/// Most callers use the infallible wrappers on [`RedisClient`] instead; this
/// type is returned by the `try_*` operations.
///
/// [`RedisClient`]: crate::RedisClient
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for Redis operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The initial handshake has not succeeded (still connecting or failed).
    #[error("Redis client is not connected")]
    NotConnected,

    /// Errors reported by the Redis driver or server.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error means the server could not be reached.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::NotConnected => true,
            Self::Redis(err) => {
                err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped()
            }
            Self::InvalidConfig { .. } => false,
        }
    }
}
