//! Error types and utilities for MongoDB operations.

/// Result type for all MongoDB operations in this crate.
///
/// Most callers use the infallible wrappers on [`MongoClient`] instead; this
/// type is returned by the `try_*` operations.
///
/// [`MongoClient`]: crate::MongoClient
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for MongoDB operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The initial handshake has not succeeded (still connecting or failed).
    #[error("MongoDB client is not connected")]
    NotConnected,

    /// Errors reported by the MongoDB driver or server.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

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
        use mongodb::error::ErrorKind;

        match self {
            Self::NotConnected => true,
            Self::Mongo(err) => matches!(
                *err.kind,
                ErrorKind::ServerSelection { .. }
                    | ErrorKind::Io(_)
                    | ErrorKind::ConnectionPoolCleared { .. }
            ),
            Self::InvalidConfig { .. } => false,
        }
    }
}
