//! Liveness and record-count reporting for the backing stores.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use fman_mongo::{Collection, MongoClient};
use fman_redis::RedisClient;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::service::{Error, Result};

/// Tracing target for status reporting.
const TRACING_TARGET: &str = "fman_server::service::status";

/// Liveness of both backing stores.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Whether the cache is connected.
    pub cache_alive: bool,
    /// Whether the document store is connected.
    pub store_alive: bool,
}

/// Record counts of the `users` and `files` collections.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub user_count: u64,
    pub file_count: u64,
}

/// Source of per-collection record counts.
///
/// A count never fails; implementations report `0` when they cannot count.
pub(crate) trait RecordCounter: Send + Sync {
    fn count(&self, collection: Collection) -> BoxFuture<'static, u64>;
}

impl RecordCounter for MongoClient {
    fn count(&self, collection: Collection) -> BoxFuture<'static, u64> {
        let client = self.clone();
        async move {
            match collection {
                Collection::Users => client.count_users().await,
                Collection::Files => client.count_files().await,
            }
        }
        .boxed()
    }
}

/// Reports store liveness and collection counts.
///
/// Holds no state of its own beyond the client handles; every call reads
/// the clients afresh.
#[derive(Clone)]
pub struct StatusReporter {
    redis: RedisClient,
    mongo: MongoClient,
    counter: Arc<dyn RecordCounter>,
}

impl StatusReporter {
    /// Creates a new reporter over the given clients.
    pub fn new(redis: RedisClient, mongo: MongoClient) -> Self {
        let counter: Arc<dyn RecordCounter> = Arc::new(mongo.clone());
        Self {
            redis,
            mongo,
            counter,
        }
    }

    /// Creates a reporter that takes record counts from `counter`.
    #[cfg(test)]
    pub(crate) fn with_counter(
        redis: RedisClient,
        mongo: MongoClient,
        counter: Arc<dyn RecordCounter>,
    ) -> Self {
        Self {
            redis,
            mongo,
            counter,
        }
    }

    /// Returns the cached liveness of both stores without any I/O.
    pub fn get_status(&self) -> StatusPayload {
        StatusPayload {
            cache_alive: self.redis.is_alive(),
            store_alive: self.mongo.is_alive(),
        }
    }

    /// Waits until both initial handshakes resolve, then reports liveness.
    pub async fn wait_resolved(&self) -> StatusPayload {
        tokio::join!(self.redis.wait_resolved(), self.mongo.wait_resolved());
        self.get_status()
    }

    /// Counts the records in the `users` and `files` collections.
    ///
    /// A failed count contributes `0`. An error is returned only when the
    /// aggregation itself does not complete.
    pub async fn get_stats(&self) -> Result<StatsPayload> {
        aggregate_counts(
            self.counter.count(Collection::Users),
            self.counter.count(Collection::Files),
        )
        .await
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("redis", &self.redis)
            .field("mongo", &self.mongo)
            .finish_non_exhaustive()
    }
}

/// Runs both counts concurrently, each in its own task.
async fn aggregate_counts<U, F>(users: U, files: F) -> Result<StatsPayload>
where
    U: Future<Output = u64> + Send + 'static,
    F: Future<Output = u64> + Send + 'static,
{
    let users = tokio::spawn(users);
    let files = tokio::spawn(files);

    let (user_count, file_count) = tokio::try_join!(users, files).map_err(|err| {
        tracing::error!(target: TRACING_TARGET, error = %err, "Record count task failed");
        Error::aggregation("Failed to count records").with_source(err)
    })?;

    tracing::debug!(target: TRACING_TARGET, user_count, file_count, "Counted records");
    Ok(StatsPayload {
        user_count,
        file_count,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fman_mongo::MongoConfig;
    use fman_redis::{MockServer, RedisConfig};

    use super::*;
    use crate::ErrorKind;

    fn unreachable_redis() -> RedisClient {
        RedisClient::connect(RedisConfig::new("127.0.0.1", 1).with_connect_timeout_secs(1))
    }

    fn unreachable_mongo() -> MongoClient {
        MongoClient::connect(
            MongoConfig::new("127.0.0.1", 1, "files_manager").with_server_selection_timeout_secs(1),
        )
    }

    fn unreachable_reporter() -> StatusReporter {
        StatusReporter::new(unreachable_redis(), unreachable_mongo())
    }

    async fn failing_count() -> u64 {
        panic!("count task failed")
    }

    /// Counts `users` and `files` as fixed numbers.
    struct FixedCounter {
        users: u64,
        files: u64,
    }

    impl RecordCounter for FixedCounter {
        fn count(&self, collection: Collection) -> BoxFuture<'static, u64> {
            let count = match collection {
                Collection::Users => self.users,
                Collection::Files => self.files,
            };
            async move { count }.boxed()
        }
    }

    /// Panics on every count.
    struct FailingCounter;

    impl RecordCounter for FailingCounter {
        fn count(&self, _collection: Collection) -> BoxFuture<'static, u64> {
            failing_count().boxed()
        }
    }

    #[tokio::test]
    async fn status_is_down_while_connecting() {
        let reporter = unreachable_reporter();
        assert_eq!(reporter.get_status(), StatusPayload::default());
    }

    #[tokio::test]
    async fn status_stays_down_after_failed_handshakes() {
        let reporter = unreachable_reporter();

        let status = tokio::time::timeout(Duration::from_secs(10), reporter.wait_resolved())
            .await
            .unwrap();

        assert!(!status.cache_alive);
        assert!(!status.store_alive);
        assert_eq!(reporter.get_status(), status);
    }

    #[tokio::test]
    async fn status_reports_each_store_separately() {
        let server = MockServer::start().await.unwrap();
        let redis = RedisClient::connect(server.config());
        let reporter = StatusReporter::new(redis, unreachable_mongo());

        let status = tokio::time::timeout(Duration::from_secs(10), reporter.wait_resolved())
            .await
            .unwrap();

        assert_eq!(
            status,
            StatusPayload {
                cache_alive: true,
                store_alive: false,
            }
        );
    }

    #[tokio::test]
    async fn stats_come_from_the_counter() {
        let counter = Arc::new(FixedCounter { users: 3, files: 10 });
        let reporter = StatusReporter::with_counter(unreachable_redis(), unreachable_mongo(), counter);

        let stats = reporter.get_stats().await.unwrap();
        assert_eq!(stats.user_count, 3);
        assert_eq!(stats.file_count, 10);
    }

    #[tokio::test]
    async fn panicking_counter_fails_stats() {
        let counter = Arc::new(FailingCounter);
        let reporter = StatusReporter::with_counter(unreachable_redis(), unreachable_mongo(), counter);

        let error = reporter.get_stats().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Aggregation);
    }

    #[tokio::test]
    async fn stats_are_zero_when_store_is_unreachable() {
        let reporter = unreachable_reporter();

        let stats = reporter.get_stats().await.unwrap();
        assert_eq!(stats, StatsPayload::default());
    }

    #[tokio::test]
    async fn aggregate_counts_collects_both_counts() {
        let stats = aggregate_counts(async { 4 }, async { 7 }).await.unwrap();
        assert_eq!(stats.user_count, 4);
        assert_eq!(stats.file_count, 7);
    }

    #[tokio::test]
    async fn aggregate_counts_reports_failed_task() {
        let error = aggregate_counts(failing_count(), async { 7 })
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Aggregation);
        assert!(std::error::Error::source(&error).is_some());
    }
}
