//! Dispatcher collaborator driven by the provider.
//!
//! The dispatcher owns JSON-RPC request correlation, subscriptions and
//! batching. The provider only drives its lifecycle and feeds it frames:
//!
//! | Provider event | Dispatcher call |
//! |----------------|-----------------|
//! | socket open | [`Dispatcher::start`], then [`Dispatcher::resume`] on success |
//! | socket message | [`Dispatcher::process_inbound_frame`] |
//! | socket close (reconnect enabled) | [`Dispatcher::pause`] |
//! | `destroy()` | [`Dispatcher::shutdown`] |
//!
//! Outbound frames go through the [`FrameWriter`](crate::FrameWriter) handed
//! to the dispatcher at construction.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Dispatcher
// ============================================================================

/// Message dispatcher fed by a [`WebSocketProvider`](crate::WebSocketProvider).
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Initializes the dispatcher once the socket reports open.
    ///
    /// Runs on a spawned task; it is never subject to a timeout.
    ///
    /// # Errors
    ///
    /// Any error is reported as [`Error::StartupFailure`](crate::Error::StartupFailure).
    async fn start(&self) -> Result<()>;

    /// Switches to active processing. Called once after each successful `start`.
    fn resume(&self);

    /// Handles one inbound text frame.
    ///
    /// Calls arrive in the order the socket received the frames.
    fn process_inbound_frame(&self, frame: String);

    /// Suspends processing while the provider reconnects.
    fn pause(&self, drop_while_paused: bool) {
        let _ = drop_while_paused;
    }

    /// Tears the dispatcher down. Called on every `destroy()`.
    fn shutdown(&self);
}
