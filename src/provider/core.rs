//! Core provider implementation.
//!
//! [`WebSocketProvider`] owns one socket at a time and wires its events into
//! a [`Dispatcher`]:
//!
//! - `open` spawns `start()` and calls `resume()` on success
//! - `message` is forwarded to `process_inbound_frame` inline, preserving order
//! - `error` is logged
//! - `close` hands over to the reconnect policy
//!
//! Every installed socket gets a new epoch; callbacks from an older epoch are
//! ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::network::Network;
use crate::socket::source::{self, ResolvedSocket};
use crate::socket::{CloseReason, ReadyState, SharedSocket, SocketEvents, SocketFactory, SocketSource};

use super::builder::{ProviderBuilder, ProviderContext};
use super::reconnect::ReconnectPolicy;
use super::state::ConnectionState;
use super::writer::{FrameWriter, SocketSlot};

// ============================================================================
// Inner
// ============================================================================

/// State shared between the provider and socket callbacks.
struct Inner<D: Dispatcher> {
    /// Driven dispatcher.
    dispatcher: Arc<D>,
    /// Currently held socket.
    slot: Arc<SocketSlot>,
    /// Producer of replacement sockets.
    factory: Option<SocketFactory>,
    /// Whether `factory` yields a fresh handle on each call.
    regenerates: bool,
    /// Reconnect behavior.
    policy: ReconnectPolicy,
    /// Runtime for startup and reconnect tasks.
    runtime: Handle,
    /// Generation of the installed socket.
    epoch: AtomicU64,
    /// Highest epoch whose open event has started the dispatcher.
    started: AtomicU64,
    /// Consecutive reconnect attempts since the last successful start.
    attempts: AtomicU32,
    /// Published lifecycle state.
    state: watch::Sender<ConnectionState>,
}

impl<D: Dispatcher> Inner<D> {
    /// Publishes `next` unless the provider is already closed.
    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if current.is_closed() || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn is_current(&self, epoch: u64) -> bool {
        !self.slot.is_released() && self.epoch.load(Ordering::Acquire) == epoch
    }

    /// Stores `socket` and wires its events.
    ///
    /// Returns `false` if the provider was destroyed in the meantime.
    fn install(self: &Arc<Self>, socket: SharedSocket) -> bool {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.slot.install(Arc::clone(&socket)) {
            return false;
        }

        socket.set_events(self.events_for(epoch));

        // The handle may have opened before its events were attached
        let already_open = socket.ready_state() == ReadyState::Open;
        debug!(epoch, already_open, "Socket installed");
        if already_open {
            self.handle_open(epoch);
        }
        true
    }

    fn events_for(self: &Arc<Self>, epoch: u64) -> SocketEvents {
        let on_open = Arc::downgrade(self);
        let on_message = Arc::downgrade(self);
        let on_close = Arc::downgrade(self);

        SocketEvents::new()
            .on_open(move || {
                if let Some(inner) = on_open.upgrade() {
                    inner.handle_open(epoch);
                }
            })
            .on_message(move |frame| {
                if let Some(inner) = on_message.upgrade() {
                    inner.handle_message(epoch, frame);
                }
            })
            .on_error(move |err| {
                warn!(epoch, error = %err, "Socket error");
            })
            .on_close(move |reason| {
                if let Some(inner) = on_close.upgrade() {
                    inner.handle_close(epoch, reason);
                }
            })
    }

    fn handle_open(self: &Arc<Self>, epoch: u64) {
        if !self.is_current(epoch) {
            debug!(epoch, "Ignoring open from stale socket");
            return;
        }
        // At most one startup per socket
        if self.started.fetch_max(epoch, Ordering::AcqRel) >= epoch {
            trace!(epoch, "Dispatcher already starting for this socket");
            return;
        }

        debug!(epoch, "Socket open, starting dispatcher");
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            match inner.dispatcher.start().await {
                Ok(()) => {
                    if !inner.is_current(epoch) {
                        debug!(epoch, "Socket replaced during startup, skipping resume");
                        return;
                    }
                    inner.dispatcher.resume();
                    inner.attempts.store(0, Ordering::Release);
                    inner.set_state(ConnectionState::Open);
                    debug!(epoch, "Provider started");
                }
                Err(e) => {
                    error!(epoch, error = %e, "Failed to start WebSocket provider");
                    inner.set_state(ConnectionState::Failed {
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    fn handle_message(&self, epoch: u64, frame: String) {
        if !self.is_current(epoch) {
            trace!(epoch, "Dropping frame from stale socket");
            return;
        }

        trace!(epoch, len = frame.len(), "Inbound frame");
        self.dispatcher.process_inbound_frame(frame);
    }

    fn handle_close(self: &Arc<Self>, epoch: u64, reason: Option<CloseReason>) {
        if !self.is_current(epoch) {
            return;
        }

        let code = reason.as_ref().map(|r| r.code);
        debug!(epoch, ?code, "Socket closed");

        if !self.policy.enabled {
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        let Some(factory) = self.factory.clone() else {
            warn!(epoch, "Socket closed and cannot be regenerated");
            self.set_state(ConnectionState::Disconnected);
            return;
        };

        if !self.regenerates {
            warn!(epoch, "Socket closed and its factory only returns the same handle");
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        self.dispatcher.pause(true);
        let inner = Arc::clone(self);
        self.runtime.spawn(inner.reconnect(factory));
    }

    /// Replaces the closed socket, backing off between attempts.
    async fn reconnect(self: Arc<Self>, factory: SocketFactory) {
        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
            if !self.policy.allows(attempt) {
                error!(
                    attempts = attempt - 1,
                    "Reconnect attempts exhausted, giving up"
                );
                self.set_state(ConnectionState::Disconnected);
                return;
            }

            self.set_state(ConnectionState::Reconnecting { attempt });
            let delay = self.policy.delay_for(attempt);
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            debug!(attempt, delay_ms, "Reconnecting");
            sleep(delay).await;

            if self.slot.is_released() {
                return;
            }

            match source::produce(&factory) {
                Ok(socket) => {
                    self.set_state(ConnectionState::Connecting);
                    if !self.install(Arc::clone(&socket)) {
                        socket.close(None);
                    }
                    return;
                }
                Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
            }
        }
    }
}

// ============================================================================
// WebSocketProvider
// ============================================================================

/// Transport adapter binding one socket to a [`Dispatcher`].
///
/// # Thread Safety
///
/// `WebSocketProvider` is `Send + Sync`. Socket events may arrive on any
/// thread while `write` and `destroy` are called from another.
pub struct WebSocketProvider<D: Dispatcher> {
    inner: Arc<Inner<D>>,
}

impl<D: Dispatcher> WebSocketProvider<D> {
    /// Creates a provider from any supported source.
    ///
    /// Reconnection is disabled; use [`builder`](Self::builder) to configure it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConstructionInput`] if the source is unusable
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn new(source: impl Into<SocketSource>, dispatcher: D) -> Result<Self> {
        Self::assemble(source.into(), None, ReconnectPolicy::default(), |_| {
            dispatcher
        })
    }

    /// Creates a builder for advanced configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    /// Resolves the source, builds the dispatcher and installs the socket.
    pub(crate) fn assemble<F>(
        source: SocketSource,
        network: Option<Network>,
        policy: ReconnectPolicy,
        make_dispatcher: F,
    ) -> Result<Self>
    where
        F: FnOnce(ProviderContext) -> D,
    {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("WebSocketProvider requires a running tokio runtime"))?;

        let ResolvedSocket {
            socket,
            factory,
            regenerates,
        } = source.resolve()?;

        let slot = Arc::new(SocketSlot::default());
        let dispatcher = Arc::new(make_dispatcher(ProviderContext {
            network,
            writer: FrameWriter::new(Arc::clone(&slot)),
        }));
        let (state, _) = watch::channel(ConnectionState::Connecting);

        debug!(
            reconnect = policy.enabled,
            regenerates,
            "WebSocketProvider created"
        );

        let inner = Arc::new(Inner {
            dispatcher,
            slot,
            factory,
            regenerates,
            policy,
            runtime,
            epoch: AtomicU64::new(0),
            started: AtomicU64::new(0),
            attempts: AtomicU32::new(0),
            state,
        });
        inner.install(socket);

        Ok(Self { inner })
    }

    /// Forwards `message` verbatim to the held socket.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] after `destroy()`
    /// - [`Error::InvalidState`] if the socket is not open yet
    /// - Any other error from the socket's `send`
    #[inline]
    pub fn write(&self, message: &str) -> Result<()> {
        self.inner.slot.write(message)
    }

    /// Returns a writer bound to this provider's socket slot.
    #[inline]
    #[must_use]
    pub fn writer(&self) -> FrameWriter {
        FrameWriter::new(Arc::clone(&self.inner.slot))
    }

    /// Returns the currently held socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] after `destroy()`.
    pub fn websocket(&self) -> Result<SharedSocket> {
        self.inner.slot.current().ok_or(Error::NotConnected)
    }

    /// Returns the driven dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<D> {
        &self.inner.dispatcher
    }

    /// Returns `true` if the provider retains a connection factory.
    ///
    /// A native handle keeps a factory that only returns that same handle, so
    /// reconnecting still requires a URL or factory source.
    #[inline]
    #[must_use]
    pub fn can_reconnect(&self) -> bool {
        self.inner.factory.is_some()
    }

    /// Returns a snapshot of the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to lifecycle state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Waits until the dispatcher has started and resumed.
    ///
    /// There is no built-in timeout; wrap the call if one is needed.
    ///
    /// # Errors
    ///
    /// - [`Error::StartupFailure`] if `start()` failed
    /// - [`Error::ConnectionClosed`] if the socket closed for good
    /// - [`Error::NotConnected`] if the provider was destroyed
    pub async fn wait_ready(&self) -> Result<()> {
        let mut state_rx = self.inner.state.subscribe();

        loop {
            let state = state_rx.borrow_and_update().clone();
            match state {
                ConnectionState::Open => return Ok(()),
                ConnectionState::Failed { message } => {
                    return Err(Error::startup_failure(message));
                }
                ConnectionState::Disconnected => return Err(Error::ConnectionClosed),
                ConnectionState::Closed => return Err(Error::NotConnected),
                ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {}
            }

            state_rx
                .changed()
                .await
                .map_err(|_| Error::NotConnected)?;
        }
    }

    /// Closes the socket, then shuts the dispatcher down.
    ///
    /// Safe to call repeatedly: the socket is closed only once, while the
    /// dispatcher's `shutdown()` runs on every call.
    pub fn destroy(&self) {
        if let Some(socket) = self.inner.slot.release() {
            debug!(state = %socket.ready_state(), "Closing socket");
            socket.close(None);
        }

        self.inner.state.send_replace(ConnectionState::Closed);
        self.inner.dispatcher.shutdown();
    }
}

impl<D: Dispatcher> fmt::Debug for WebSocketProvider<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketProvider")
            .field("state", &*self.inner.state.borrow())
            .field("epoch", &self.inner.epoch.load(Ordering::Acquire))
            .field("reconnect", &self.inner.policy.enabled)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
