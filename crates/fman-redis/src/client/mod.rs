//! Redis client connection management and configuration.

mod redis_client;
mod redis_config;

pub use redis_client::RedisClient;
pub use redis_config::RedisConfig;
