//! MongoDB client connection management and configuration.

mod mongo_client;
mod mongo_config;

pub use mongo_client::MongoClient;
pub use mongo_config::MongoConfig;
