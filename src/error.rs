//! Error types for the WebSocket provider.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use websocket_provider::{Error, Result};
//!
//! fn forward(provider: &WebSocketProvider<MyDispatcher>) -> Result<()> {
//!     provider.write(r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Construction | [`Error::InvalidConstructionInput`], [`Error::Config`] |
//! | Connection | [`Error::NotConnected`], [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::InvalidState`] |
//! | Lifecycle | [`Error::StartupFailure`], [`Error::Dispatcher`] |
//! | External | [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::socket::ReadyState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// Construction input cannot produce a usable socket.
    ///
    /// Returned synchronously when a URL is malformed, uses a non-WebSocket
    /// scheme, or a supplied handle is already closing or closed.
    #[error("Invalid construction input: {message}")]
    InvalidConstructionInput {
        /// Why the input was rejected.
        message: String,
    },

    /// Configuration error.
    ///
    /// Returned when the provider or socket is configured incorrectly,
    /// e.g. constructed outside a tokio runtime.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// No socket is held.
    ///
    /// Returned by writes and handle access after `destroy()`.
    #[error("websocket closed")]
    NotConnected,

    /// Socket is not in a state that accepts the operation.
    #[error("Socket is {state}, expected open")]
    InvalidState {
        /// State the socket was in.
        state: ReadyState,
    },

    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt timed out.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The socket's I/O task has terminated.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Dispatcher startup failed after the socket opened.
    #[error("Failed to start provider: {message}")]
    StartupFailure {
        /// Error reported by the dispatcher.
        message: String,
    },

    /// Error raised by a dispatcher implementation.
    #[error("Dispatcher error: {message}")]
    Dispatcher {
        /// Description of the dispatcher error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid construction input error.
    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidConstructionInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(state: ReadyState) -> Self {
        Self::InvalidState { state }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a startup failure error.
    #[inline]
    pub fn startup_failure(message: impl Into<String>) -> Self {
        Self::StartupFailure {
            message: message.into(),
        }
    }

    /// Creates a dispatcher error.
    #[inline]
    pub fn dispatcher(message: impl Into<String>) -> Self {
        Self::Dispatcher {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::InvalidState { .. }
                | Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed with a fresh connection.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
