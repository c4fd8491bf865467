//! Connectivity state of a self-healing producer.

use std::fmt;

/// Where a producer is in its lifecycle.
///
/// `Disconnected` is initial. `Connected` is reached at most once, after
/// which no further connect attempts are made. `Stopped` is terminal and
/// reachable from both other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No publisher installed; the background task may still be trying.
    Disconnected,

    /// A publisher is installed and calls are forwarded to it.
    Connected,

    /// `shutdown` has run.
    Stopped,
}

impl ConnectionState {
    /// Returns `true` if calls are forwarded to a publisher.
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    /// Returns a lowercase label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
