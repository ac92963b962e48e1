#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for connection state transitions.
pub const TRACING_TARGET_CONNECTION: &str = "fman_core::connection";

mod connection;

pub mod prelude;

pub use connection::{ConnectionSnapshot, ConnectionState, ConnectionTracker};
