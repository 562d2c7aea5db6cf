//! Provider connection state.

use std::fmt;

/// Lifecycle state of a [`WebSocketProvider`](crate::WebSocketProvider).
///
/// ```text
/// Connecting ──open──► Open ──close──► Reconnecting ──► Connecting ...
///     │                  │                  │
///     └──start fails──► Failed              └──budget spent──► Disconnected
///
/// any state ──destroy()──► Closed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket acquired, open event not yet handled.
    Connecting,
    /// Dispatcher started and resumed.
    Open,
    /// Dispatcher `start()` failed after the socket opened.
    Failed {
        /// Startup error message.
        message: String,
    },
    /// Waiting to replace a closed socket.
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Socket closed and will not be replaced.
    Disconnected,
    /// Provider destroyed.
    Closed,
}

impl ConnectionState {
    /// Returns `true` once `destroy()` has run.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the dispatcher is actively processing.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Failed { message } => write!(f, "failed: {message}"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Closed => f.write_str("closed"),
        }
    }
}
