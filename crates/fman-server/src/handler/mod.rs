//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use fman_server::handler::routes;
//! use fman_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! config.validate()?;
//! let state = ServiceState::from_config(&config);
//! let router: axum::Router = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod monitors;
mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, StatsResponse, StatusResponse};
use crate::service::ServiceState;

/// Tracing target for unmatched routes.
const TRACING_TARGET: &str = "fman_server::handler";

#[inline]
async fn fallback(uri: axum::http::Uri) -> Response {
    tracing::debug!(target: TRACING_TARGET, %uri, "No route matched");
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().merge(monitors::routes()).fallback(fallback)
}

#[cfg(test)]
mod test {
    use axum::Router;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use fman_mongo::MongoConfig;
    use fman_redis::{MockServer, RedisConfig};
    use serde_json::json;

    use crate::handler::routes;
    use crate::service::{ServiceConfig, ServiceState};

    /// Nothing listens on port 1, so the MongoDB handshake fails fast.
    fn unreachable_mongo_config() -> MongoConfig {
        MongoConfig::new("127.0.0.1", 1, "files_manager").with_server_selection_timeout_secs(1)
    }

    /// Returns state whose stores listen nowhere, so both handshakes fail fast.
    pub fn create_test_state() -> anyhow::Result<ServiceState> {
        let config = ServiceConfig::new(
            RedisConfig::new("127.0.0.1", 1).with_connect_timeout_secs(1),
            unreachable_mongo_config(),
        );
        config.validate()?;
        Ok(ServiceState::from_config(&config))
    }

    /// Returns state whose cache is served by `redis` while MongoDB stays
    /// unreachable.
    pub fn create_test_state_with_redis(redis: &MockServer) -> anyhow::Result<ServiceState> {
        let config = ServiceConfig::new(redis.config(), unreachable_mongo_config());
        config.validate()?;
        Ok(ServiceState::from_config(&config))
    }

    /// Returns a new [`TestServer`] with the given router.
    pub async fn create_test_server_with_router(
        router: impl Fn(ServiceState) -> Router<ServiceState>,
    ) -> anyhow::Result<TestServer> {
        let state = create_test_state()?;
        let router = router(state.clone());
        create_test_server_with_state(router, state)
    }

    /// Returns a new [`TestServer`] with the given router and state.
    pub fn create_test_server_with_state(
        router: Router<ServiceState>,
        state: ServiceState,
    ) -> anyhow::Result<TestServer> {
        let app = router.with_state(state);
        let server = TestServer::new(app)?;
        Ok(server)
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server.get("/missing").await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Not found" }));

        Ok(())
    }
}
