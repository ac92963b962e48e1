//! Redis client wrapper and connection management.
//!
//! # Connection Lifecycle
//!
//! [`RedisClient::connect`] returns immediately. The handshake runs on a
//! background task and resolves the client exactly once:
//!
//! - **Ready**: a multiplexed [`ConnectionManager`] answered `PING` and is
//!   cached for all callers
//! - **Failed**: the error is logged and kept as the last error cause; the
//!   client stays not-alive for the life of the process
//!
//! After `Ready`, every command updates liveness. A command that finds the
//! server unreachable marks the client not-alive, and the next successful
//! command marks it alive again. The [`ConnectionManager`] reconnects on the
//! command after an I/O failure, so recovery needs no extra work here.
//!
//! The cached [`ConnectionManager`] is cheap to clone and safe to use from
//! many tasks at once, so no locking happens around commands.
//!
//! # Failure Semantics
//!
//! [`get`], [`set`] and [`delete`] never return errors. Failures are logged
//! and collapsed into `None` or a no-op, which means a missing key and an
//! unreachable server look the same to the caller. The `try_*` variants return
//! the underlying [`Error`] instead.
//!
//! [`get`]: RedisClient::get
//! [`set`]: RedisClient::set
//! [`delete`]: RedisClient::delete

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use fman_core::{ConnectionSnapshot, ConnectionState, ConnectionTracker};
use redis::FromRedisValue;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::sync::OnceCell;

use super::redis_config::RedisConfig;
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// Name reported by the connection tracker.
const SERVICE_NAME: &str = "redis";

/// Redis client wrapper with connection management.
///
/// This wrapper is cheaply cloneable and thread-safe.
/// Multiple clones share the same underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    inner: Arc<RedisClientInner>,
}

/// Inner data for Redis client
struct RedisClientInner {
    connection: OnceCell<ConnectionManager>,
    tracker: ConnectionTracker,
    config: RedisConfig,
}

impl RedisClient {
    /// Creates a client and starts connecting in the background.
    ///
    /// Must be called from within a Tokio runtime. Connection failures are
    /// logged and leave the client in [`ConnectionState::Failed`]; they are
    /// never returned to the caller.
    pub fn connect(config: RedisConfig) -> Self {
        let client = Self::disconnected(config);

        let background = client.clone();
        tokio::spawn(async move { background.establish().await });

        client
    }

    /// Creates a client that never attempts to connect.
    fn disconnected(config: RedisConfig) -> Self {
        Self {
            inner: Arc::new(RedisClientInner {
                connection: OnceCell::new(),
                tracker: ConnectionTracker::new(SERVICE_NAME),
                config,
            }),
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RedisConfig {
        &self.inner.config
    }

    /// Returns `true` if the handshake succeeded and the last command did
    /// not find the server unreachable.
    ///
    /// Reads cached state only; never performs a round trip.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.tracker.is_alive()
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.tracker.state()
    }

    /// Waits for the initial handshake to resolve.
    pub async fn wait_resolved(&self) -> ConnectionState {
        self.inner.tracker.wait_resolved().await
    }

    /// Returns the connection state together with the last error cause.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.inner.tracker.snapshot()
    }

    /// Runs the handshake and resolves the connection state.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    async fn establish(&self) {
        let url = self.inner.config.url();
        tracing::info!(target: TRACING_TARGET_CONNECTION, %url, "Connecting to Redis");

        match self.open().await {
            Ok(manager) => {
                // Only this task writes the cell, so it is always empty here.
                let _ = self.inner.connection.set(manager);
                self.inner.tracker.mark_ready();
                tracing::info!(
                    target: TRACING_TARGET_CONNECTION,
                    %url,
                    "Successfully connected to Redis"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    %url,
                    error = %err,
                    "Redis client not connected to the server"
                );
                self.inner.tracker.mark_failed(&err);
            }
        }
    }

    async fn open(&self) -> Result<ConnectionManager> {
        let config = &self.inner.config;
        config.validate()?;

        let client = redis::Client::open(config.url())?;
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout())
            .set_response_timeout(config.response_timeout())
            .set_number_of_retries(0);

        let mut manager = ConnectionManager::new_with_config(client, manager_config).await?;
        redis::cmd("PING")
            .query_async::<String>(&mut manager)
            .await?;

        Ok(manager)
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.inner
            .connection
            .get()
            .cloned()
            .ok_or(Error::NotConnected)
    }

    /// Runs `cmd` on the shared connection and updates liveness.
    async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let result = self.execute(cmd).await;
        match &result {
            Ok(_) => {
                self.inner.tracker.mark_reachable();
            }
            Err(err) if err.is_unreachable() => {
                self.inner.tracker.mark_unreachable(err);
            }
            Err(_) => {}
        }
        result
    }

    async fn execute<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut conn = self.connection()?;
        Ok(cmd.query_async(&mut conn).await?)
    }

    fn report_failure(&self, command: &'static str, key: &str, err: &Error) {
        tracing::error!(
            target: TRACING_TARGET_CLIENT,
            command,
            key,
            error = %err,
            "Redis command failed"
        );
        self.inner
            .tracker
            .record_error(format_args!("{command} {key}: {err}"));
    }
}

// Fallible commands
impl RedisClient {
    /// Fetches the value stored at `key`, or `None` if it does not exist.
    pub async fn try_get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.query(redis::cmd("GET").arg(key)).await?;

        if value.is_some() {
            tracing::debug!(target: TRACING_TARGET_CLIENT, key, "Cache HIT");
        } else {
            tracing::debug!(target: TRACING_TARGET_CLIENT, key, "Cache MISS");
        }

        Ok(value)
    }

    /// Stores `value` at `key`, expiring after `ttl_secs` seconds.
    ///
    /// The expiry is applied atomically with the write (`SET key value EX ttl`).
    pub async fn try_set(&self, key: &str, value: &str, ttl_secs: NonZeroU64) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_secs.get());
        self.query::<()>(&cmd).await?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            key,
            ttl_secs = ttl_secs.get(),
            "Cache SET"
        );
        Ok(())
    }

    /// Removes `key`. Returns `true` if the key existed.
    pub async fn try_delete(&self, key: &str) -> Result<bool> {
        let removed: u64 = self.query(redis::cmd("DEL").arg(key)).await?;

        tracing::debug!(target: TRACING_TARGET_CLIENT, key, removed, "Cache DEL");
        Ok(removed > 0)
    }
}

// Infallible commands
impl RedisClient {
    /// Fetches the value stored at `key`.
    ///
    /// Returns `None` both when the key is missing and when the command fails.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(err) => {
                self.report_failure("GET", key, &err);
                None
            }
        }
    }

    /// Stores `value` at `key` with an expiry of `ttl_secs` seconds.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: NonZeroU64) {
        if let Err(err) = self.try_set(key, value, ttl_secs).await {
            self.report_failure("SET", key, &err);
        }
    }

    /// Removes `key`.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn delete(&self, key: &str) {
        if let Err(err) = self.try_delete(key).await {
            self.report_failure("DEL", key, &err);
        }
    }
}

impl fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisClient")
            .field("url", &self.inner.config.url())
            .field("state", &self.state())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::MockServer;

    fn ttl(secs: u64) -> NonZeroU64 {
        NonZeroU64::new(secs).unwrap()
    }

    /// Nothing listens on port 1, so the handshake is refused right away.
    fn unreachable_config() -> RedisConfig {
        RedisConfig::new("127.0.0.1", 1).with_connect_timeout_secs(1)
    }

    #[test]
    fn disconnected_client_is_not_alive() {
        let client = RedisClient::disconnected(RedisConfig::default());
        assert!(!client.is_alive());
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn commands_on_disconnected_client_return_defaults() {
        let client = RedisClient::disconnected(RedisConfig::default());

        assert_eq!(client.get("missing").await, None);
        client.set("key", "value", ttl(10)).await;
        client.delete("key").await;

        assert!(matches!(
            client.try_get("key").await,
            Err(Error::NotConnected)
        ));

        let snapshot = client.snapshot();
        assert_eq!(snapshot.service, "redis");
        assert_eq!(snapshot.last_error.as_deref(), Some("DEL key: Redis client is not connected"));
    }

    #[tokio::test]
    async fn is_alive_does_not_block_while_connecting() {
        let client = RedisClient::connect(unreachable_config());

        let start = Instant::now();
        assert!(!client.is_alive());
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn unreachable_server_resolves_to_failed() {
        let client = RedisClient::connect(unreachable_config());

        let state = tokio::time::timeout(Duration::from_secs(10), client.wait_resolved())
            .await
            .unwrap();

        assert_eq!(state, ConnectionState::Failed);
        assert!(!client.is_alive());
        assert!(client.snapshot().last_error.is_some());
        assert_eq!(client.get("anything").await, None);
    }

    #[tokio::test]
    async fn invalid_config_resolves_to_failed() {
        let client = RedisClient::connect(RedisConfig::new("", 6379));

        let state = tokio::time::timeout(Duration::from_secs(1), client.wait_resolved())
            .await
            .unwrap();

        assert_eq!(state, ConnectionState::Failed);
        let last_error = client.snapshot().last_error.unwrap();
        assert!(last_error.contains("host cannot be empty"));
    }

    async fn resolved(client: &RedisClient) -> ConnectionState {
        tokio::time::timeout(Duration::from_secs(5), client.wait_resolved())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn mock_server_resolves_to_ready() {
        let server = MockServer::start().await.unwrap();
        let client = RedisClient::connect(server.config());

        assert_eq!(resolved(&client).await, ConnectionState::Ready);
        assert!(client.is_alive());
        assert_eq!(client.try_get("missing").await.unwrap(), None);
        client.set("key", "value", ttl(10)).await;
        assert!(client.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn lost_server_turns_client_not_alive() {
        let server = MockServer::start().await.unwrap();
        let client = RedisClient::connect(server.config());
        assert_eq!(resolved(&client).await, ConnectionState::Ready);
        assert!(client.is_alive());

        server.stop().await;

        // The first command may still race the closed socket; the reconnect
        // attempt behind it is refused.
        for _ in 0..3 {
            assert_eq!(client.get("key").await, None);
        }

        assert!(!client.is_alive());
        assert_eq!(client.state(), ConnectionState::Ready);
        let snapshot = client.snapshot();
        assert!(!snapshot.open);
        assert!(snapshot.last_error.is_some());
    }

    #[tokio::test]
    async fn restarted_server_turns_client_alive_again() {
        let server = MockServer::start().await.unwrap();
        let addr = server.addr();
        let client = RedisClient::connect(server.config());
        assert_eq!(resolved(&client).await, ConnectionState::Ready);

        server.stop().await;
        for _ in 0..3 {
            let _ = client.try_get("key").await;
        }
        assert!(!client.is_alive());

        let _server = MockServer::bind(addr).await.unwrap();
        let recovered = tokio::time::timeout(Duration::from_secs(10), async {
            while client.try_get("key").await.is_err() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        assert!(recovered.is_ok());
        assert!(client.is_alive());
    }

    // Integration tests require a running Redis instance (behind test-services feature)
    #[cfg(feature = "test-services")]
    mod integration {
        use super::*;

        fn live_config() -> RedisConfig {
            let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_owned());
            let port = std::env::var("REDIS_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(6379);
            RedisConfig::new(host, port)
        }

        async fn live_client() -> Option<RedisClient> {
            let client = RedisClient::connect(live_config());
            match client.wait_resolved().await {
                ConnectionState::Ready => Some(client),
                state => {
                    eprintln!("Skipping Redis test (state: {state})");
                    None
                }
            }
        }

        fn unique_key(prefix: &str) -> String {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos();
            format!("fman:test:{prefix}:{nanos}")
        }

        #[tokio::test]
        async fn set_get_delete() {
            let Some(client) = live_client().await else {
                return;
            };
            assert!(client.is_alive());

            let key = unique_key("crud");
            client.set(&key, "value", ttl(60)).await;
            assert_eq!(client.get(&key).await.as_deref(), Some("value"));

            client.delete(&key).await;
            assert_eq!(client.get(&key).await, None);
        }

        #[tokio::test]
        async fn ttl_expiry_is_honored() {
            let Some(client) = live_client().await else {
                return;
            };

            let key = unique_key("ttl");
            client.set(&key, "temporary", ttl(1)).await;
            assert!(client.get(&key).await.is_some());

            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert_eq!(client.get(&key).await, None);
        }

        #[tokio::test]
        async fn delete_reports_existence() {
            let Some(client) = live_client().await else {
                return;
            };

            let key = unique_key("del");
            client.set(&key, "value", ttl(60)).await;
            assert!(client.try_delete(&key).await.unwrap());
            assert!(!client.try_delete(&key).await.unwrap());
        }
    }
}
