//! Monitor response types.

use serde::{Deserialize, Serialize};

use crate::service::{StatsPayload, StatusPayload};

/// Liveness of both backing stores.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the Redis cache is connected.
    pub redis: bool,
    /// Whether the MongoDB document store is connected.
    pub db: bool,
}

impl From<StatusPayload> for StatusResponse {
    fn from(status: StatusPayload) -> Self {
        Self {
            redis: status.cache_alive,
            db: status.store_alive,
        }
    }
}

/// Record counts of the `users` and `files` collections.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub users: u64,
    pub files: u64,
}

impl From<StatsPayload> for StatsResponse {
    fn from(stats: StatsPayload) -> Self {
        Self {
            users: stats.user_count,
            files: stats.file_count,
        }
    }
}
