//! Application state and dependency injection.

mod config;
mod status;

use fman_mongo::MongoClient;
use fman_redis::RedisClient;

pub use crate::service::config::ServiceConfig;
#[cfg(test)]
pub(crate) use crate::service::status::RecordCounter;
pub use crate::service::status::{StatsPayload, StatusPayload, StatusReporter};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    // External services:
    pub redis: RedisClient,
    pub mongo: MongoClient,

    // Internal services:
    pub status_reporter: StatusReporter,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Both clients start connecting in the background, so this returns
    /// before either handshake resolves. A client whose configuration is
    /// invalid resolves to failed. Must be called from within a Tokio runtime.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let redis = config.connect_redis();
        let mongo = config.connect_mongo();

        Self {
            status_reporter: StatusReporter::new(redis.clone(), mongo.clone()),
            redis,
            mongo,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(redis: RedisClient);
impl_di!(mongo: MongoClient);

// Internal services:
impl_di!(status_reporter: StatusReporter);
