//! Service layer error types and utilities.
//!
//! Errors carry a [`ErrorKind`] for categorization, a human-readable message
//! and an optional boxed source for error chaining.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing service layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuration-related errors.
    Config,
    /// Backing store communication errors.
    External,
    /// A statistics computation did not complete.
    Aggregation,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::External => "external_service",
            Self::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    /// The error category/type
    kind: ErrorKind,
    /// Human-readable error message
    message: Cow<'static, str>,
    /// Optional underlying error that caused this error
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new backing store error.
    #[inline]
    pub fn external(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let full_message = format!("{}: {}", service.into(), message.into());
        Self::new(ErrorKind::External, full_message)
    }

    /// Creates a new aggregation error.
    #[inline]
    pub fn aggregation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Aggregation, message)
    }
}

impl From<fman_redis::Error> for Error {
    fn from(err: fman_redis::Error) -> Self {
        match err {
            fman_redis::Error::InvalidConfig { .. } => {
                Error::config("Invalid Redis configuration").with_source(err)
            }
            _ => Error::external("redis", err.to_string()).with_source(err),
        }
    }
}

impl From<fman_mongo::Error> for Error {
    fn from(err: fman_mongo::Error) -> Self {
        match err {
            fman_mongo::Error::InvalidConfig { .. } => {
                Error::config("Invalid MongoDB configuration").with_source(err)
            }
            _ => Error::external("mongodb", err.to_string()).with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::config("invalid configuration");
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.message(), "invalid configuration");
    }

    #[test]
    fn test_error_with_source() {
        let source = std::io::Error::other("task aborted");
        let error = Error::aggregation("Failed to count records").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert_eq!(error.kind(), ErrorKind::Aggregation);
        assert_eq!(
            error.to_string(),
            "aggregation error: Failed to count records"
        );
    }

    #[test]
    fn test_external_service_error() {
        let error = Error::external("redis", "Connection refused");

        assert_eq!(error.kind(), ErrorKind::External);
        assert_eq!(error.message(), "redis: Connection refused");
    }

    #[test]
    fn test_store_error_conversion() {
        let error = Error::from(fman_redis::Error::invalid_config("Redis port cannot be zero"));
        assert_eq!(error.kind(), ErrorKind::Config);

        let error = Error::from(fman_mongo::Error::NotConnected);
        assert_eq!(error.kind(), ErrorKind::External);
        assert!(error.message().starts_with("mongodb: "));
    }

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::External.as_str(), "external_service");
        assert_eq!(ErrorKind::Aggregation.as_str(), "aggregation");
    }
}
