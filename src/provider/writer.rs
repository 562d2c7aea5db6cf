//! Guarded socket slot and the dispatcher-facing writer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{Error, Result};
use crate::socket::SharedSocket;

// ============================================================================
// SocketSlot
// ============================================================================

/// Holds at most one live socket.
///
/// Install and release both take the write lock, so a released slot can never
/// be refilled and readers never see a half-released handle.
#[derive(Default)]
pub(crate) struct SocketSlot {
    socket: RwLock<Option<SharedSocket>>,
    released: AtomicBool,
}

impl SocketSlot {
    /// Returns the held socket, if any.
    pub(crate) fn current(&self) -> Option<SharedSocket> {
        self.socket.read().clone()
    }

    /// Stores `socket`, replacing any previous one.
    ///
    /// Returns `false` without storing once the slot has been released.
    pub(crate) fn install(&self, socket: SharedSocket) -> bool {
        let mut guard = self.socket.write();
        if self.released.load(Ordering::Acquire) {
            return false;
        }
        *guard = Some(socket);
        true
    }

    /// Permanently empties the slot, returning the socket it held.
    pub(crate) fn release(&self) -> Option<SharedSocket> {
        let mut guard = self.socket.write();
        self.released.store(true, Ordering::Release);
        guard.take()
    }

    /// Returns `true` once [`release`](Self::release) has run.
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Sends `message` through the held socket.
    ///
    /// The read guard is held across `send`, so [`release`](Self::release)
    /// waits for in-flight writes before the socket can be closed.
    pub(crate) fn write(&self, message: &str) -> Result<()> {
        // Recursive read: a handle may deliver frames from inside `send`
        let guard = self.socket.read_recursive();
        let socket = guard.as_ref().ok_or(Error::NotConnected)?;
        trace!(len = message.len(), "Writing frame");
        socket.send(message)
    }
}

// ============================================================================
// FrameWriter
// ============================================================================

/// Cloneable handle a dispatcher uses to emit outbound frames.
///
/// Writes go to whichever socket the provider currently holds, so a writer
/// keeps working across reconnects and fails with [`Error::NotConnected`]
/// after `destroy()`.
#[derive(Clone)]
pub struct FrameWriter {
    slot: Arc<SocketSlot>,
}

impl FrameWriter {
    pub(crate) fn new(slot: Arc<SocketSlot>) -> Self {
        Self { slot }
    }

    /// Forwards `message` verbatim to the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the provider holds no socket
    /// - Any error from the socket's `send`
    #[inline]
    pub fn write(&self, message: &str) -> Result<()> {
        self.slot.write(message)
    }

    /// Returns `true` while a socket is held.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.slot.current().is_some()
    }
}

impl fmt::Debug for FrameWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameWriter")
            .field("connected", &self.is_connected())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
