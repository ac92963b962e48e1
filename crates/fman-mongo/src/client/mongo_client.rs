//! MongoDB client wrapper and connection management.
//!
//! The driver keeps its own connection pool behind [`mongodb::Client`], so a
//! single cached [`Database`] handle is shared by every caller. The handle is
//! written once by the background handshake and read without awaiting.
//!
//! After the handshake, each count updates liveness: a count that cannot
//! reach the server marks the client not-alive until a later count succeeds.

use std::fmt;
use std::sync::Arc;

use fman_core::{ConnectionSnapshot, ConnectionState, ConnectionTracker};
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tokio::sync::OnceCell;

use super::mongo_config::MongoConfig;
use crate::{Collection, Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// Name reported by the connection tracker.
const SERVICE_NAME: &str = "mongodb";

/// MongoDB client wrapper with connection management.
///
/// This wrapper is cheaply cloneable and thread-safe.
#[derive(Clone)]
pub struct MongoClient {
    inner: Arc<MongoClientInner>,
}

/// Inner data for MongoDB client
struct MongoClientInner {
    database: OnceCell<Database>,
    tracker: ConnectionTracker,
    config: MongoConfig,
}

impl MongoClient {
    /// Creates a client and starts connecting in the background.
    ///
    /// Must be called from within a Tokio runtime. Connection failures are
    /// logged and leave the client in [`ConnectionState::Failed`]; they are
    /// never returned to the caller.
    pub fn connect(config: MongoConfig) -> Self {
        let client = Self::disconnected(config);

        let background = client.clone();
        tokio::spawn(async move { background.establish().await });

        client
    }

    /// Creates a client that never attempts to connect.
    fn disconnected(config: MongoConfig) -> Self {
        Self {
            inner: Arc::new(MongoClientInner {
                database: OnceCell::new(),
                tracker: ConnectionTracker::new(SERVICE_NAME),
                config,
            }),
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &MongoConfig {
        &self.inner.config
    }

    /// Returns `true` if the handshake succeeded and the last count did not
    /// find the server unreachable.
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
        let uri = self.inner.config.uri();
        let database = self.inner.config.database();
        tracing::info!(target: TRACING_TARGET_CONNECTION, %uri, database, "Connecting to MongoDB");

        match self.open().await {
            Ok(handle) => {
                // Only this task writes the cell, so it is always empty here.
                let _ = self.inner.database.set(handle);
                self.inner.tracker.mark_ready();
                tracing::info!(
                    target: TRACING_TARGET_CONNECTION,
                    %uri,
                    database,
                    "Connected to MongoDB"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    %uri,
                    database,
                    error = %err,
                    "Failed to connect to MongoDB"
                );
                self.inner.tracker.mark_failed(&err);
            }
        }
    }

    async fn open(&self) -> Result<Database> {
        let config = &self.inner.config;
        config.validate()?;

        let uri = config.uri();
        let mut options = ClientOptions::parse(uri.as_str()).await?;
        options.app_name = Some(config.app_name().to_owned());
        options.server_selection_timeout = Some(config.server_selection_timeout());
        options.connect_timeout = Some(config.server_selection_timeout());

        let client = Client::with_options(options)?;
        let database = client.database(config.database());
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(database)
    }

    fn database(&self) -> Result<&Database> {
        self.inner.database.get().ok_or(Error::NotConnected)
    }
}

// Collection counts
impl MongoClient {
    /// Returns the number of documents in `collection`.
    pub async fn try_count_records(&self, collection: &str) -> Result<u64> {
        match self.count_documents(collection).await {
            Ok(count) => {
                self.inner.tracker.mark_reachable();
                tracing::debug!(target: TRACING_TARGET_CLIENT, collection, count, "Counted documents");
                Ok(count)
            }
            Err(err) => {
                if err.is_unreachable() {
                    self.inner.tracker.mark_unreachable(&err);
                }
                Err(err)
            }
        }
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        let count = self
            .database()?
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    /// Returns the number of documents in `collection`.
    ///
    /// Returns `0` both for an empty collection and when the count fails.
    pub async fn count_records(&self, collection: &str) -> u64 {
        match self.try_count_records(collection).await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_CLIENT,
                    collection,
                    error = %err,
                    "Error counting documents"
                );
                self.inner
                    .tracker
                    .record_error(format_args!("count {collection}: {err}"));
                0
            }
        }
    }

    /// Returns the number of documents in the `users` collection.
    pub async fn count_users(&self) -> u64 {
        self.count_records(Collection::Users.name()).await
    }

    /// Returns the number of documents in the `files` collection.
    pub async fn count_files(&self) -> u64 {
        self.count_records(Collection::Files.name()).await
    }
}

impl fmt::Debug for MongoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoClient")
            .field("uri", &self.inner.config.uri())
            .field("database", &self.inner.config.database())
            .field("state", &self.state())
            .field("alive", &self.is_alive())
            .finish()
    }
}
