//! Store liveness and record-count handlers.

use axum::Json;
use axum::extract::State;
use axum::routing::{Router, get};

use crate::handler::response::{StatsResponse, StatusResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{ServiceState, StatusReporter};

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "fman_server::handler::monitors";

/// Reports whether the cache and the document store are connected.
///
/// Always answers `200 OK`; a store that is down is reported as `false`.
#[tracing::instrument(skip_all)]
async fn get_status(State(status_reporter): State<StatusReporter>) -> Json<StatusResponse> {
    let status = status_reporter.get_status();

    tracing::debug!(
        target: TRACING_TARGET,
        redis = status.cache_alive,
        db = status.store_alive,
        "Status requested"
    );

    Json(status.into())
}

/// Reports the number of users and files.
#[tracing::instrument(skip_all)]
async fn get_stats(State(status_reporter): State<StatusReporter>) -> Result<Json<StatsResponse>> {
    let stats = status_reporter.get_stats().await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET,
            error = %err,
            "Failed to fetch stats"
        );

        ErrorKind::InternalServerError
            .with_message("Error fetching stats")
            .with_context(err.to_string())
    })?;

    tracing::debug!(
        target: TRACING_TARGET,
        users = stats.user_count,
        files = stats.file_count,
        "Stats requested"
    );

    Ok(Json(stats.into()))
}

/// Returns a [`Router`] with all monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/stats", get(get_stats))
}
