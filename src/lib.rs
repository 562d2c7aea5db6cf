//! WebSocket Provider - socket transport adapter for JSON-RPC dispatchers.
//!
//! This library keeps a long-lived WebSocket (or any compatible socket) alive,
//! delivers its inbound frames to a dispatcher and accepts outbound frames
//! from it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   open / message / close   ┌───────────────────┐
//! │ SocketHandle │───────────────────────────►│ WebSocketProvider │
//! │ (WebSocket,  │◄───────────────────────────│                   │
//! │  custom)     │        send / close        │   start, resume,  │
//! └──────────────┘                            │   frames, shutdown│
//!                                             └─────────┬─────────┘
//!                                                       ▼
//!                                               ┌──────────────┐
//!                                               │  Dispatcher  │
//!                                               └──────────────┘
//! ```
//!
//! Key design principles:
//!
//! - Exactly one socket is held at a time, behind a lock
//! - Construction input is a tagged union resolved once
//! - Inbound frames reach the dispatcher in arrival order
//! - `destroy()` closes the socket before shutting the dispatcher down
//!
//! # Quick Start
//!
//! ```no_run
//! use async_trait::async_trait;
//! use websocket_provider::{Dispatcher, FrameWriter, Result, WebSocketProvider};
//!
//! struct Rpc {
//!     writer: FrameWriter,
//! }
//!
//! #[async_trait]
//! impl Dispatcher for Rpc {
//!     async fn start(&self) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn resume(&self) {
//!         let _ = self.writer.write(r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#);
//!     }
//!
//!     fn process_inbound_frame(&self, frame: String) {
//!         println!("received {frame}");
//!     }
//!
//!     fn shutdown(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let provider = WebSocketProvider::<Rpc>::builder()
//!         .url("wss://node.example/ws")
//!         .build(|ctx| Rpc { writer: ctx.writer })?;
//!
//!     provider.wait_ready().await?;
//!     provider.destroy();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dispatcher`] | [`Dispatcher`] collaborator trait |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`network`] | [`Network`] descriptor |
//! | [`provider`] | [`WebSocketProvider`] and its configuration |
//! | [`socket`] | [`SocketHandle`] abstraction and native [`WebSocket`] |

// ============================================================================
// Modules
// ============================================================================

/// Dispatcher collaborator trait.
pub mod dispatcher;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Network descriptor passed through to dispatchers.
pub mod network;

/// Provider adapter, builder and reconnect policy.
///
/// Use [`WebSocketProvider::builder()`] to create a configured provider.
pub mod provider;

/// Socket handles and construction inputs.
///
/// - [`SocketHandle`] - capability interface for any socket
/// - [`WebSocket`] - native `tokio-tungstenite` handle
/// - [`SocketSource`] - construction input union
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

// Dispatcher
pub use dispatcher::Dispatcher;

// Error types
pub use error::{Error, Result};

// Network
pub use network::Network;

// Provider types
pub use provider::{
    ConnectionState, FrameWriter, ProviderBuilder, ProviderContext, ReconnectPolicy,
    WebSocketProvider,
};

// Socket types
pub use socket::{
    CloseReason, ReadyState, SharedSocket, SocketEvents, SocketFactory, SocketHandle,
    SocketSource, WebSocket,
};
