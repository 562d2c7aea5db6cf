//! Socket handle abstraction.
//!
//! A [`SocketHandle`] is one physical, message-oriented connection. Anything
//! that reports a [`ReadyState`], accepts a [`SocketEvents`] table, sends text
//! payloads and can be closed may back a provider.
//!
//! # Event Delivery
//!
//! Handles deliver events by invoking the registered [`SocketEvents`]
//! callbacks. Implementations must invoke `on_message` sequentially in arrival
//! order; the provider relies on this for frame ordering.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Shared, type-erased socket handle.
pub type SharedSocket = Arc<dyn SocketHandle>;

/// Open event callback.
pub type OpenHandler = Arc<dyn Fn() + Send + Sync>;

/// Message event callback. Receives one textual frame.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Error event callback.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Close event callback.
pub type CloseHandler = Arc<dyn Fn(Option<CloseReason>) + Send + Sync>;

// ============================================================================
// ReadyState
// ============================================================================

/// Connection state of a socket handle.
///
/// Numeric codes match the standard WebSocket `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Connection not yet established.
    Connecting = 0,
    /// Connection established, frames may be sent.
    Open = 1,
    /// Close handshake in progress.
    Closing = 2,
    /// Connection closed or never opened.
    Closed = 3,
}

impl ReadyState {
    /// Returns the numeric state code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses a numeric state code.
    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Connecting),
            1 => Some(Self::Open),
            2 => Some(Self::Closing),
            3 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns `true` for `Connecting` and `Open`.
    #[inline]
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// CloseReason
// ============================================================================

/// Close code and reason exchanged in a close handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code.
    pub code: u16,
    /// Human-readable reason.
    pub reason: String,
}

impl CloseReason {
    /// Normal closure (1000).
    pub const NORMAL: u16 = 1000;

    /// Creates a close reason.
    #[inline]
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a normal closure with empty reason.
    #[inline]
    #[must_use]
    pub fn normal() -> Self {
        Self::new(Self::NORMAL, "")
    }
}

// ============================================================================
// SocketEvents
// ============================================================================

/// Callback table registered on a socket handle.
///
/// Unset slots are ignored when the handle emits the corresponding event.
#[derive(Clone, Default)]
pub struct SocketEvents {
    on_open: Option<OpenHandler>,
    on_message: Option<MessageHandler>,
    on_error: Option<ErrorHandler>,
    on_close: Option<CloseHandler>,
}

impl SocketEvents {
    /// Creates an empty callback table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the open callback.
    #[must_use]
    pub fn on_open(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(handler));
        self
    }

    /// Sets the message callback.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Sets the close callback.
    #[must_use]
    pub fn on_close(
        mut self,
        handler: impl Fn(Option<CloseReason>) + Send + Sync + 'static,
    ) -> Self {
        self.on_close = Some(Arc::new(handler));
        self
    }

    /// Invokes the open callback.
    pub fn emit_open(&self) {
        if let Some(ref handler) = self.on_open {
            handler();
        }
    }

    /// Invokes the message callback.
    pub fn emit_message(&self, payload: String) {
        if let Some(ref handler) = self.on_message {
            handler(payload);
        }
    }

    /// Invokes the error callback.
    pub fn emit_error(&self, error: &Error) {
        if let Some(ref handler) = self.on_error {
            handler(error);
        }
    }

    /// Invokes the close callback.
    pub fn emit_close(&self, reason: Option<CloseReason>) {
        if let Some(ref handler) = self.on_close {
            handler(reason);
        }
    }
}

impl fmt::Debug for SocketEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketEvents")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

// ============================================================================
// SocketHandle
// ============================================================================

/// Capability interface of a message-oriented socket.
pub trait SocketHandle: Send + Sync + 'static {
    /// Returns the current connection state.
    fn ready_state(&self) -> ReadyState;

    /// Replaces the registered callback table.
    fn set_events(&self, events: SocketEvents);

    /// Sends one textual payload.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the socket is not open
    /// - [`Error::ConnectionClosed`] if the underlying transport is gone
    fn send(&self, payload: &str) -> Result<()>;

    /// Starts the close handshake. Closing an already closed socket is a no-op.
    fn close(&self, reason: Option<CloseReason>);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_ready_state_codes() {
        assert_eq!(ReadyState::Connecting.code(), 0);
        assert_eq!(ReadyState::Open.code(), 1);
        assert_eq!(ReadyState::Closing.code(), 2);
        assert_eq!(ReadyState::Closed.code(), 3);
    }

    #[test]
    fn test_ready_state_from_code() {
        for state in [
            ReadyState::Connecting,
            ReadyState::Open,
            ReadyState::Closing,
            ReadyState::Closed,
        ] {
            assert_eq!(ReadyState::from_code(state.code()), Some(state));
        }
        assert_eq!(ReadyState::from_code(4), None);
    }

    #[test]
    fn test_ready_state_is_live() {
        assert!(ReadyState::Connecting.is_live());
        assert!(ReadyState::Open.is_live());
        assert!(!ReadyState::Closing.is_live());
        assert!(!ReadyState::Closed.is_live());
    }

    #[test]
    fn test_close_reason_normal() {
        let reason = CloseReason::normal();
        assert_eq!(reason.code, 1000);
        assert!(reason.reason.is_empty());
    }

    #[test]
    fn test_empty_events_ignore_emits() {
        let events = SocketEvents::new();
        events.emit_open();
        events.emit_message("ignored".into());
        events.emit_error(&Error::ConnectionClosed);
        events.emit_close(None);
    }

    #[test]
    fn test_events_invoke_registered_handlers() {
        let opens = Arc::new(AtomicUsize::new(0));
        let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let opens_clone = Arc::clone(&opens);
        let frames_clone = Arc::clone(&frames);
        let events = SocketEvents::new()
            .on_open(move || {
                opens_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_message(move |text| frames_clone.lock().push(text));

        events.emit_open();
        events.emit_message("a".into());
        events.emit_message("b".into());

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(*frames.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_events_debug_shows_registered_slots() {
        let events = SocketEvents::new().on_open(|| {});
        let debug = format!("{events:?}");
        assert!(debug.contains("on_open: true"));
        assert!(debug.contains("on_message: false"));
    }
}
