//! Prelude module for fman-redis.
//!
//! # Example
//!
//! ```rust,ignore
//! use fman_redis::prelude::*;
//!
//! let client = RedisClient::connect(RedisConfig::default());
//! assert!(!client.is_alive());
//! ```

pub use crate::client::{RedisClient, RedisConfig};
pub use crate::{ConnectionSnapshot, ConnectionState, Error, Result};
