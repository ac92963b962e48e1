#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for MongoDB client operations.
///
/// Use this target for logging query failures and counts.
pub const TRACING_TARGET_CLIENT: &str = "fman_mongo::client";

/// Tracing target for MongoDB connection operations.
///
/// Use this target for logging connection establishment and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "fman_mongo::connection";

mod client;
mod collection;
mod error;

pub mod prelude;

pub use client::{MongoClient, MongoConfig};
pub use collection::Collection;
pub use error::{Error, Result};
pub use fman_core::{ConnectionSnapshot, ConnectionState};
