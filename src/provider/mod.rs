//! WebSocket provider module.
//!
//! This module provides the adapter binding a socket to a dispatcher.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WebSocketProvider`] | Owns the socket and drives the dispatcher |
//! | [`ProviderBuilder`] | Fluent configuration builder |
//! | [`ProviderContext`] | Values handed to the dispatcher constructor |
//! | [`FrameWriter`] | Dispatcher-facing outbound writer |
//! | [`ReconnectPolicy`] | Opt-in reconnect backoff |
//! | [`ConnectionState`] | Observable lifecycle state |
//!
//! # Lifecycle
//!
//! 1. Construct from a URL, factory, native or custom handle
//! 2. Socket opens → `start()` → `resume()`
//! 3. Inbound frames → `process_inbound_frame()` in arrival order
//! 4. Dispatcher writes through [`FrameWriter`]
//! 5. `destroy()` closes the socket, then calls `shutdown()`

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for provider configuration.
pub mod builder;

/// Core provider implementation.
pub mod core;

/// Reconnect backoff options.
pub mod reconnect;

/// Provider lifecycle state.
pub mod state;

/// Socket slot and outbound writer.
pub mod writer;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ProviderBuilder, ProviderContext};
pub use self::core::WebSocketProvider;
pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
pub use writer::FrameWriter;
