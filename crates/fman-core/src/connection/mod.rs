//! Connection lifecycle tracking for store clients.

mod state;
mod tracker;

pub use state::{ConnectionSnapshot, ConnectionState};
pub use tracker::ConnectionTracker;
