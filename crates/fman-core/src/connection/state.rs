//! Connection states and point-in-time snapshots.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Lifecycle state of a single store connection.
///
/// The only transitions are `Connecting -> Ready` and `Connecting -> Failed`.
/// A client that failed at startup stays `Failed` for the life of the process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    /// The initial handshake has not resolved yet.
    #[default]
    Connecting = 0,
    /// The handshake succeeded and a usable handle is cached.
    Ready = 1,
    /// The handshake failed; no handle is available.
    Failed = 2,
}

impl ConnectionState {
    /// Returns `true` once the state has left `Connecting`.
    #[inline]
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Connecting)
    }

    /// Returns `true` if the connection is usable.
    #[inline]
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    #[inline]
    pub(crate) const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Failed,
            _ => Self::Connecting,
        }
    }
}

/// Point-in-time view of a connection, including the last observed error cause.
///
/// Store clients collapse operation failures into benign defaults (`None`, `0`).
/// The snapshot keeps the cause around for diagnostics without changing that
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// Name of the store the connection belongs to.
    pub service: String,
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Whether the connection is usable right now.
    pub open: bool,
    /// Message of the most recent connection or operation error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the most recent error was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_connecting() {
        let state = ConnectionState::default();
        assert_eq!(state, ConnectionState::Connecting);
        assert!(!state.is_resolved());
        assert!(!state.is_ready());
    }

    #[test]
    fn resolved_states() {
        assert!(ConnectionState::Ready.is_resolved());
        assert!(ConnectionState::Ready.is_ready());
        assert!(ConnectionState::Failed.is_resolved());
        assert!(!ConnectionState::Failed.is_ready());
    }

    #[test]
    fn u8_conversion_is_stable() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Ready,
            ConnectionState::Failed,
        ] {
            assert_eq!(ConnectionState::from_u8(state.as_u8()), state);
        }

        assert_eq!(ConnectionState::from_u8(42), ConnectionState::Connecting);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(ConnectionState::Ready.to_string(), "ready");
        let name: &'static str = ConnectionState::Failed.into();
        assert_eq!(name, "failed");
    }

    #[test]
    fn snapshot_skips_empty_error() {
        let snapshot = ConnectionSnapshot {
            service: "redis".to_owned(),
            state: ConnectionState::Ready,
            open: true,
            last_error: None,
            last_error_at: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["open"], true);
        assert!(json.get("last_error").is_none());
    }
}
