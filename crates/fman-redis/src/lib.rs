#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for Redis client operations.
///
/// Use this target for logging command failures and cache hits or misses.
pub const TRACING_TARGET_CLIENT: &str = "fman_redis::client";

/// Tracing target for Redis connection operations.
///
/// Use this target for logging connection establishment and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "fman_redis::connection";

mod client;
mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;

pub mod prelude;

pub use client::{RedisClient, RedisConfig};
pub use error::{Error, Result};
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mock::MockServer;
pub use fman_core::{ConnectionSnapshot, ConnectionState};
