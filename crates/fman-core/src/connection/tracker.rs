//! Shared, lock-free connection state tracking.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jiff::Timestamp;
use tokio::sync::watch;

use super::state::{ConnectionSnapshot, ConnectionState};
use crate::TRACING_TARGET_CONNECTION;

/// Tracks the lifecycle of one store connection.
///
/// Two pieces of state are kept apart. The handshake state moves once from
/// `Connecting` to `Ready` or `Failed`. The open flag follows the connection
/// after a successful handshake: it drops when an operation finds the server
/// unreachable and comes back when a later operation succeeds.
///
/// The tracker is cheaply cloneable; all clones observe the same state.
/// Reading either piece is a single atomic load and never waits on the
/// connection itself.
#[derive(Clone)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    service: &'static str,
    state: AtomicU8,
    open: AtomicBool,
    resolved: watch::Sender<ConnectionState>,
    last_error: Mutex<Option<(String, Timestamp)>>,
}

impl ConnectionTracker {
    /// Creates a tracker in the [`ConnectionState::Connecting`] state.
    pub fn new(service: &'static str) -> Self {
        let (resolved, _) = watch::channel(ConnectionState::Connecting);

        Self {
            inner: Arc::new(TrackerInner {
                service,
                state: AtomicU8::new(ConnectionState::Connecting.as_u8()),
                open: AtomicBool::new(false),
                resolved,
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Returns the name of the tracked store.
    #[inline]
    #[must_use]
    pub fn service(&self) -> &'static str {
        self.inner.service
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Returns `true` if the handshake has succeeded.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Returns `true` if the handshake succeeded and the connection is still open.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.is_ready() && self.inner.open.load(Ordering::Acquire)
    }

    /// Moves `Connecting -> Ready` and opens the connection.
    ///
    /// Returns `false` and leaves the state untouched if it was already resolved.
    pub fn mark_ready(&self) -> bool {
        let resolved = self.resolve(ConnectionState::Ready);
        if resolved {
            self.inner.open.store(true, Ordering::Release);
        }
        resolved
    }

    /// Marks the connection open again after a successful operation.
    ///
    /// Has no effect before the handshake succeeded. Returns `true` if the
    /// connection was closed before.
    pub fn mark_reachable(&self) -> bool {
        if !self.is_ready() || self.inner.open.swap(true, Ordering::AcqRel) {
            return false;
        }

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            service = self.inner.service,
            "connection restored"
        );
        true
    }

    /// Marks the connection closed after an operation found the server
    /// unreachable, and records the cause.
    ///
    /// Returns `true` if the connection was open before.
    pub fn mark_unreachable(&self, error: impl fmt::Display) -> bool {
        self.record_error(&error);
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return false;
        }

        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            service = self.inner.service,
            error = %error,
            "connection lost"
        );
        true
    }

    /// Moves `Connecting -> Failed` and records the cause.
    ///
    /// Returns `false` and leaves the state untouched if it was already resolved.
    /// The error is recorded either way.
    pub fn mark_failed(&self, error: impl fmt::Display) -> bool {
        self.record_error(&error);
        self.resolve(ConnectionState::Failed)
    }

    /// Records the cause of a failed operation without touching the state.
    pub fn record_error(&self, error: impl fmt::Display) {
        let mut last_error = self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last_error = Some((error.to_string(), Timestamp::now()));
    }

    /// Waits until the state leaves `Connecting` and returns the resolved state.
    ///
    /// Liveness checks must not use this; it exists for startup reporting.
    pub async fn wait_resolved(&self) -> ConnectionState {
        let mut receiver = self.inner.resolved.subscribe();
        match receiver.wait_for(|state| state.is_resolved()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Returns a point-in-time snapshot including the last error cause.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let last_error = self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let (last_error, last_error_at) = match last_error {
            Some((message, at)) => (Some(message), Some(at)),
            None => (None, None),
        };

        ConnectionSnapshot {
            service: self.inner.service.to_owned(),
            state: self.state(),
            open: self.is_alive(),
            last_error,
            last_error_at,
        }
    }

    fn resolve(&self, target: ConnectionState) -> bool {
        let swapped = self
            .inner
            .state
            .compare_exchange(
                ConnectionState::Connecting.as_u8(),
                target.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if swapped {
            self.inner.resolved.send_replace(target);
            tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                service = self.inner.service,
                state = %target,
                "connection state resolved"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                service = self.inner.service,
                current = %self.state(),
                requested = %target,
                "ignoring transition out of a resolved connection state"
            );
        }

        swapped
    }
}

impl fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTracker")
            .field("service", &self.inner.service)
            .field("state", &self.state())
            .field("open", &self.inner.open.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_connecting() {
        let tracker = ConnectionTracker::new("redis");
        assert_eq!(tracker.state(), ConnectionState::Connecting);
        assert!(!tracker.is_ready());
        assert_eq!(tracker.service(), "redis");
    }

    #[test]
    fn ready_is_terminal() {
        let tracker = ConnectionTracker::new("redis");
        assert!(tracker.mark_ready());
        assert!(tracker.is_ready());

        assert!(!tracker.mark_failed("late failure"));
        assert_eq!(tracker.state(), ConnectionState::Ready);
    }

    #[test]
    fn failed_is_terminal() {
        let tracker = ConnectionTracker::new("mongodb");
        assert!(tracker.mark_failed("connection refused"));
        assert_eq!(tracker.state(), ConnectionState::Failed);

        assert!(!tracker.mark_ready());
        assert_eq!(tracker.state(), ConnectionState::Failed);
    }

    #[test]
    fn clones_share_state() {
        let tracker = ConnectionTracker::new("redis");
        let clone = tracker.clone();
        tracker.mark_ready();
        assert!(clone.is_ready());
    }

    #[test]
    fn snapshot_keeps_last_error() {
        let tracker = ConnectionTracker::new("mongodb");
        assert!(tracker.snapshot().last_error.is_none());

        tracker.mark_failed("connection refused");
        tracker.record_error("not connected");

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.service, "mongodb");
        assert_eq!(snapshot.state, ConnectionState::Failed);
        assert_eq!(snapshot.last_error.as_deref(), Some("not connected"));
        assert!(snapshot.last_error_at.is_some());
    }

    #[test]
    fn alive_only_after_ready() {
        let tracker = ConnectionTracker::new("redis");
        assert!(!tracker.is_alive());

        tracker.mark_ready();
        assert!(tracker.is_alive());
        assert!(tracker.snapshot().open);
    }

    #[test]
    fn unreachable_closes_and_reachable_reopens() {
        let tracker = ConnectionTracker::new("redis");
        tracker.mark_ready();

        assert!(tracker.mark_unreachable("broken pipe"));
        assert!(!tracker.is_alive());
        assert_eq!(tracker.state(), ConnectionState::Ready);
        assert!(!tracker.mark_unreachable("connection refused"));

        let snapshot = tracker.snapshot();
        assert!(!snapshot.open);
        assert_eq!(snapshot.last_error.as_deref(), Some("connection refused"));

        assert!(tracker.mark_reachable());
        assert!(tracker.is_alive());
        assert!(!tracker.mark_reachable());
    }

    #[test]
    fn reachable_does_not_open_unresolved_or_failed() {
        let tracker = ConnectionTracker::new("mongodb");
        assert!(!tracker.mark_reachable());
        assert!(!tracker.is_alive());

        tracker.mark_failed("connection refused");
        assert!(!tracker.mark_reachable());
        assert!(!tracker.is_alive());
    }

    #[test]
    fn failure_before_handshake_does_not_block_ready() {
        let tracker = ConnectionTracker::new("mongodb");
        tracker.mark_unreachable("not connected");

        tracker.mark_ready();
        assert!(tracker.is_alive());
    }

    #[tokio::test]
    async fn wait_resolved_returns_after_transition() {
        let tracker = ConnectionTracker::new("redis");
        let waiter = tracker.clone();

        let handle = tokio::spawn(async move { waiter.wait_resolved().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tracker.mark_ready();

        let state = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state, ConnectionState::Ready);
    }

    #[tokio::test]
    async fn wait_resolved_returns_immediately_when_resolved() {
        let tracker = ConnectionTracker::new("redis");
        tracker.mark_failed("boom");

        let state = tokio::time::timeout(Duration::from_millis(100), tracker.wait_resolved())
            .await
            .unwrap();
        assert_eq!(state, ConnectionState::Failed);
    }
}
