//! Socket handles and construction inputs.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handle` | [`SocketHandle`] trait, [`ReadyState`], [`SocketEvents`] |
//! | `source` | [`SocketSource`] construction inputs and [`SocketFactory`] |
//! | `websocket` | Native `tokio-tungstenite` handle |

// ============================================================================
// Submodules
// ============================================================================

/// Socket handle abstraction.
pub mod handle;

/// Construction inputs and connection factories.
pub mod source;

/// Native WebSocket handle.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use handle::{CloseReason, ReadyState, SharedSocket, SocketEvents, SocketHandle};
pub use source::{SocketFactory, SocketSource};
pub use websocket::WebSocket;
