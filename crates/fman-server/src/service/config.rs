#[cfg(feature = "config")]
use clap::Args;
use fman_mongo::{MongoClient, MongoConfig};
use fman_redis::{RedisClient, RedisConfig};
use serde::{Deserialize, Serialize};

use crate::service::Result;

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Redis cache connection settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub redis: RedisConfig,

    /// MongoDB document store connection settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub mongo: MongoConfig,
}

impl ServiceConfig {
    /// Creates a new configuration from both store configurations.
    pub fn new(redis: RedisConfig, mongo: MongoConfig) -> Self {
        Self { redis, mongo }
    }

    /// Validates both store configurations.
    ///
    /// Meant to run once at startup; the `connect_*` methods do not repeat it.
    pub fn validate(&self) -> Result<()> {
        self.redis.validate()?;
        self.mongo.validate()?;
        Ok(())
    }

    /// Creates the Redis client and starts its background handshake.
    pub fn connect_redis(&self) -> RedisClient {
        RedisClient::connect(self.redis.clone())
    }

    /// Creates the MongoDB client and starts its background handshake.
    pub fn connect_mongo(&self) -> MongoClient {
        MongoClient::connect(self.mongo.clone())
    }
}
