//! Prelude module for fman-mongo.
//!
//! # Example
//!
//! ```rust,ignore
//! use fman_mongo::prelude::*;
//!
//! let client = MongoClient::connect(MongoConfig::default());
//! assert!(!client.is_alive());
//! ```

pub use crate::client::{MongoClient, MongoConfig};
pub use crate::collection::Collection;
pub use crate::{ConnectionSnapshot, ConnectionState, Error, Result};
