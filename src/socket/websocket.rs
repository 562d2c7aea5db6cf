//! Native WebSocket handle.
//!
//! [`WebSocket`] is the default [`SocketHandle`] implementation, backed by
//! `tokio-tungstenite`. Construction is synchronous: the handle is returned in
//! [`ReadyState::Connecting`] while a spawned I/O task performs the handshake.
//!
//! # Event Loop
//!
//! The I/O task:
//!
//! - Connects to the endpoint (bounded by a 30s timeout)
//! - Holds events until a [`SocketEvents`] table is attached
//! - Emits `open`, then pumps inbound frames and outbound commands
//! - Emits `close` exactly once when the connection ends

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::handle::{CloseReason, ReadyState, SocketEvents, SocketHandle};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the connect and upgrade handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal commands for the event loop.
enum SocketCommand {
    /// Send a text frame.
    Send(String),
    /// Start the close handshake.
    Close(Option<CloseReason>),
}

/// State shared between the handle and its I/O task.
struct Shared {
    state: AtomicU8,
    events: RwLock<SocketEvents>,
    attached: Notify,
}

impl Shared {
    fn state(&self) -> ReadyState {
        ReadyState::from_code(self.state.load(Ordering::Acquire)).unwrap_or(ReadyState::Closed)
    }

    fn set_state(&self, state: ReadyState) {
        self.state.store(state.code(), Ordering::Release);
    }

    fn events(&self) -> SocketEvents {
        self.events.read().clone()
    }
}

// ============================================================================
// WebSocket
// ============================================================================

/// WebSocket client handle backed by `tokio-tungstenite`.
///
/// # Thread Safety
///
/// `WebSocket` is `Send + Sync`. Events are delivered from the I/O task;
/// `send` and `close` may be called from any thread.
pub struct WebSocket {
    /// Endpoint address.
    url: Url,
    /// State shared with the I/O task.
    shared: Arc<Shared>,
    /// Channel for sending commands to the I/O task.
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    /// Orders the state check and enqueue of `send` against `close`.
    gate: Mutex<()>,
}

impl WebSocket {
    /// Starts connecting to `url` and returns immediately.
    ///
    /// Events are held back until [`SocketHandle::set_events`] is called.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConstructionInput`] if `url` is not a `ws`/`wss` URL
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn connect(url: &str) -> Result<Self> {
        let url = parse_url(url)?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("WebSocket requires a running tokio runtime"))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: AtomicU8::new(ReadyState::Connecting.code()),
            events: RwLock::new(SocketEvents::default()),
            attached: Notify::new(),
        });

        runtime.spawn(Self::run_event_loop(
            url.clone(),
            Arc::clone(&shared),
            command_rx,
        ));

        debug!(url = %url, "WebSocket connecting");

        Ok(Self {
            url,
            shared,
            command_tx,
            gate: Mutex::new(()),
        })
    }

    /// Returns the endpoint address.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// I/O task driving one connection from handshake to close.
    async fn run_event_loop(
        url: Url,
        shared: Arc<Shared>,
        mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    ) {
        let connected = tokio::select! {
            result = timeout(CONNECT_TIMEOUT, connect_async(url.as_str())) => match result {
                Ok(Ok((stream, _response))) => Ok(stream),
                Ok(Err(e)) => Err(Error::connection(format!("{url}: {e}"))),
                Err(_) => Err(Error::connection_timeout(
                    u64::try_from(CONNECT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
                )),
            },
            () = Self::wait_for_close(&mut command_rx) => {
                debug!(url = %url, "WebSocket closed before connecting");
                shared.set_state(ReadyState::Closed);
                shared.events().emit_close(None);
                return;
            }
        };

        // Hold events until someone is listening
        let attached = tokio::select! {
            () = shared.attached.notified() => true,
            () = Self::wait_for_close(&mut command_rx) => false,
        };

        let stream = match connected {
            Ok(stream) if attached => stream,
            Ok(mut stream) => {
                let _ = stream.close(None).await;
                shared.set_state(ReadyState::Closed);
                debug!(url = %url, "WebSocket closed before events were attached");
                return;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "WebSocket connect failed");
                shared.set_state(ReadyState::Closed);
                let events = shared.events();
                events.emit_error(&e);
                events.emit_close(None);
                return;
            }
        };

        shared.set_state(ReadyState::Open);
        debug!(url = %url, "WebSocket open");
        shared.events().emit_open();

        let reason = Self::pump(stream, &shared, &mut command_rx).await;

        shared.set_state(ReadyState::Closed);
        debug!(url = %url, code = ?reason.as_ref().map(|r| r.code), "WebSocket closed");
        shared.events().emit_close(reason);
    }

    /// Resolves once a close command arrives or every handle is dropped.
    async fn wait_for_close(command_rx: &mut mpsc::UnboundedReceiver<SocketCommand>) {
        loop {
            match command_rx.recv().await {
                // send() rejects frames until the socket is open
                Some(SocketCommand::Send(_)) => trace!("Ignoring frame queued before open"),
                Some(SocketCommand::Close(_)) | None => return,
            }
        }
    }

    /// Pumps frames in both directions until the connection ends.
    async fn pump(
        stream: WsStream,
        shared: &Shared,
        command_rx: &mut mpsc::UnboundedReceiver<SocketCommand>,
    ) -> Option<CloseReason> {
        let (mut ws_write, mut ws_read) = stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.as_str().len(), "Frame received");
                            shared.events().emit_message(text.as_str().to_owned());
                        }

                        Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                            Ok(text) => shared.events().emit_message(text),
                            Err(_) => warn!(len = data.len(), "Dropping non-UTF-8 binary frame"),
                        },

                        Some(Ok(Message::Close(frame))) => {
                            debug!("WebSocket closed by remote");
                            return frame.map(|f| {
                                CloseReason::new(u16::from(f.code), f.reason.as_str())
                            });
                        }

                        Some(Err(e)) => {
                            let error = Error::WebSocket(e);
                            warn!(error = %error, "WebSocket error");
                            shared.events().emit_error(&error);
                            return None;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            return None;
                        }

                        // Ignore Ping, Pong, raw Frame
                        Some(Ok(_)) => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Send(payload)) => {
                            if let Err(e) = ws_write.send(Message::Text(payload.into())).await {
                                let error = Error::WebSocket(e);
                                warn!(error = %error, "Failed to send frame");
                                shared.events().emit_error(&error);
                                return None;
                            }
                            trace!("Frame sent");
                        }

                        Some(SocketCommand::Close(reason)) => {
                            shared.set_state(ReadyState::Closing);
                            let frame = reason.as_ref().map(|r| CloseFrame {
                                code: CloseCode::from(r.code),
                                reason: r.reason.clone().into(),
                            });
                            let _ = ws_write.send(Message::Close(frame)).await;
                            let _ = ws_write.close().await;
                            return reason;
                        }

                        None => {
                            debug!("All handles dropped, closing WebSocket");
                            let _ = ws_write.close().await;
                            return None;
                        }
                    }
                }
            }
        }
    }
}

impl SocketHandle for WebSocket {
    fn ready_state(&self) -> ReadyState {
        self.shared.state()
    }

    fn set_events(&self, events: SocketEvents) {
        *self.shared.events.write() = events;
        self.shared.attached.notify_one();
    }

    fn send(&self, payload: &str) -> Result<()> {
        // A frame accepted here is queued ahead of any close command
        let _gate = self.gate.lock();
        let state = self.shared.state();
        if state != ReadyState::Open {
            return Err(Error::invalid_state(state));
        }

        self.command_tx
            .send(SocketCommand::Send(payload.to_owned()))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn close(&self, reason: Option<CloseReason>) {
        let _gate = self.gate.lock();
        if !self.shared.state().is_live() {
            return;
        }

        self.shared.set_state(ReadyState::Closing);
        let _ = self.command_tx.send(SocketCommand::Close(reason));
    }
}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("url", &self.url.as_str())
            .field("ready_state", &self.shared.state())
            .finish()
    }
}

// ============================================================================
// URL Validation
// ============================================================================

/// Parses and validates a WebSocket endpoint address.
pub(crate) fn parse_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::invalid_input(format!("invalid url {url:?}: {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(Error::invalid_input(format!(
            "unsupported scheme {other:?}, expected ws or wss"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
