//! Shared test doubles: a scripted socket and a recording dispatcher.

#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;
use websocket_provider::{
    CloseReason, ConnectionState, Dispatcher, Error, FrameWriter, ReadyState, Result,
    SocketEvents, SocketHandle, WebSocketProvider,
};

/// Upper bound for any wait in tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Installs a tracing subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MockSocket
// ============================================================================

/// Socket whose events are fired by the test.
pub struct MockSocket {
    state: Mutex<ReadyState>,
    events: Mutex<SocketEvents>,
    sent: Mutex<Vec<String>>,
    closes: AtomicUsize,
    open_on_attach: AtomicBool,
}

impl MockSocket {
    /// Creates a socket in the connecting state.
    pub fn new() -> Arc<Self> {
        Self::with_state(ReadyState::Connecting)
    }

    pub fn with_state(state: ReadyState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            events: Mutex::new(SocketEvents::new()),
            sent: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            open_on_attach: AtomicBool::new(false),
        })
    }

    /// Creates a socket that opens just as its events are replaced, so the
    /// open event reaches the previous table. A handle opening on its own I/O
    /// thread can do this.
    pub fn opening_on_attach() -> Arc<Self> {
        let socket = Self::new();
        socket.open_on_attach.store(true, Ordering::SeqCst);
        socket
    }

    fn events(&self) -> SocketEvents {
        self.events.lock().clone()
    }

    pub fn fire_open(&self) {
        *self.state.lock() = ReadyState::Open;
        self.events().emit_open();
    }

    pub fn fire_message(&self, frame: &str) {
        self.events().emit_message(frame.to_owned());
    }

    pub fn fire_error(&self, error: &Error) {
        self.events().emit_error(error);
    }

    /// Simulates the remote side closing the connection.
    pub fn fire_close(&self, reason: Option<CloseReason>) {
        *self.state.lock() = ReadyState::Closed;
        self.events().emit_close(reason);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SocketHandle for MockSocket {
    fn ready_state(&self) -> ReadyState {
        *self.state.lock()
    }

    fn set_events(&self, events: SocketEvents) {
        if self.open_on_attach.load(Ordering::SeqCst) {
            self.fire_open();
        }
        *self.events.lock() = events;
    }

    fn send(&self, payload: &str) -> Result<()> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(Error::invalid_state(state));
        }
        self.sent.lock().push(payload.to_owned());
        Ok(())
    }

    fn close(&self, reason: Option<CloseReason>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        let was_live = {
            let mut state = self.state.lock();
            let live = state.is_live();
            *state = ReadyState::Closed;
            live
        };
        if was_live {
            self.events().emit_close(reason);
        }
    }
}

// ============================================================================
// ParkedSocket
// ============================================================================

/// Open socket whose `send` parks between two barriers.
///
/// The test waits on `entered` to know a send is in flight and on `resume`
/// to let it finish.
pub struct ParkedSocket {
    pub entered: Barrier,
    pub resume: Barrier,
    in_flight: AtomicBool,
    closed_during_send: AtomicBool,
    closes: AtomicUsize,
}

impl ParkedSocket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Barrier::new(2),
            resume: Barrier::new(2),
            in_flight: AtomicBool::new(false),
            closed_during_send: AtomicBool::new(false),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn closed_during_send(&self) -> bool {
        self.closed_during_send.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SocketHandle for ParkedSocket {
    fn ready_state(&self) -> ReadyState {
        if self.close_count() > 0 {
            ReadyState::Closed
        } else {
            ReadyState::Open
        }
    }

    fn set_events(&self, _events: SocketEvents) {}

    fn send(&self, _payload: &str) -> Result<()> {
        self.in_flight.store(true, Ordering::SeqCst);
        self.entered.wait();
        self.resume.wait();
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self, _reason: Option<CloseReason>) {
        if self.in_flight.load(Ordering::SeqCst) {
            self.closed_during_send.store(true, Ordering::SeqCst);
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// RecordingDispatcher
// ============================================================================

/// One observed dispatcher call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    Resume,
    Frame(String),
    Pause(bool),
    Shutdown,
}

/// Dispatcher that records every call in order.
#[derive(Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<Call>>,
    fail_start: AtomicBool,
    changed: Notify,
    writer: Mutex<Option<FrameWriter>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher whose `start()` always fails.
    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.fail_start.store(true, Ordering::SeqCst);
        dispatcher
    }

    /// Dispatcher holding the provider's writer.
    pub fn with_writer(writer: FrameWriter) -> Self {
        let dispatcher = Self::default();
        *dispatcher.writer.lock() = Some(writer);
        dispatcher
    }

    pub fn writer(&self) -> Option<FrameWriter> {
        self.writer.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
        self.changed.notify_one();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn frames(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Frame(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.lock().iter().filter(|call| *call == wanted).count()
    }

    /// Waits until at least `n` frames have been recorded.
    pub async fn wait_for_frames(&self, n: usize) -> Vec<String> {
        timeout(WAIT, async {
            loop {
                let notified = self.changed.notified();
                let frames = self.frames();
                if frames.len() >= n {
                    return frames;
                }
                notified.await;
            }
        })
        .await
        .expect("frames within timeout")
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn start(&self) -> Result<()> {
        self.record(Call::Start);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::dispatcher("chain id lookup failed"));
        }
        Ok(())
    }

    fn resume(&self) {
        self.record(Call::Resume);
    }

    fn process_inbound_frame(&self, frame: String) {
        self.record(Call::Frame(frame));
    }

    fn pause(&self, drop_while_paused: bool) {
        self.record(Call::Pause(drop_while_paused));
    }

    fn shutdown(&self) {
        self.record(Call::Shutdown);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Waits until the provider's state satisfies `predicate`.
pub async fn wait_for_state<D, F>(provider: &WebSocketProvider<D>, predicate: F) -> ConnectionState
where
    D: Dispatcher,
    F: Fn(&ConnectionState) -> bool,
{
    let mut state_rx = provider.subscribe_state();
    timeout(WAIT, async {
        loop {
            let state = state_rx.borrow_and_update().clone();
            if predicate(&state) {
                return state;
            }
            state_rx.changed().await.expect("state sender alive");
        }
    })
    .await
    .expect("state within timeout")
}
