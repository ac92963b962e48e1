//! Prelude module for fman-core.
//!
//! ```rust,ignore
//! use fman_core::prelude::*;
//! ```

pub use crate::connection::{ConnectionSnapshot, ConnectionState, ConnectionTracker};
