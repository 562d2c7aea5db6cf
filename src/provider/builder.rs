//! Builder pattern for provider configuration.
//!
//! Provides a fluent API for configuring and creating [`WebSocketProvider`]
//! instances.
//!
//! # Example
//!
//! ```ignore
//! use websocket_provider::{Network, ReconnectPolicy, WebSocketProvider};
//!
//! let provider = WebSocketProvider::builder()
//!     .url("wss://node.example/ws")
//!     .network(Network::new("mainnet", 1))
//!     .reconnect(ReconnectPolicy::exponential())
//!     .build(|ctx| RpcDispatcher::new(ctx.network, ctx.writer))?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::network::Network;
use crate::socket::{SharedSocket, SocketSource};

use super::core::WebSocketProvider;
use super::reconnect::ReconnectPolicy;
use super::writer::FrameWriter;

// ============================================================================
// ProviderContext
// ============================================================================

/// Values handed to the dispatcher constructor.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Network descriptor, passed through unmodified.
    pub network: Option<Network>,
    /// Writer for outbound frames.
    pub writer: FrameWriter,
}

// ============================================================================
// ProviderBuilder
// ============================================================================

/// Builder for configuring a [`WebSocketProvider`].
///
/// Use [`WebSocketProvider::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct ProviderBuilder {
    /// Socket construction input.
    source: Option<SocketSource>,
    /// Network descriptor for the dispatcher.
    network: Option<Network>,
    /// Reconnect behavior.
    reconnect: ReconnectPolicy,
}

// ============================================================================
// ProviderBuilder Implementation
// ============================================================================

impl ProviderBuilder {
    /// Creates a new builder with no source and reconnection disabled.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the construction input.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: impl Into<SocketSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Connects to a WebSocket endpoint address.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(SocketSource::url(url));
        self
    }

    /// Uses a factory that can be invoked again on reconnect.
    #[inline]
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<SharedSocket> + Send + Sync + 'static,
    {
        self.source = Some(SocketSource::factory(factory));
        self
    }

    /// Sets the network descriptor passed to the dispatcher.
    #[inline]
    #[must_use]
    pub fn network(mut self, network: impl Into<Network>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Builds the provider, constructing the dispatcher from a
    /// [`ProviderContext`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no source is set, the reconnect policy is
    ///   invalid, or no tokio runtime is running
    /// - [`Error::InvalidConstructionInput`] if the source is unusable
    pub fn build<D, F>(self, make_dispatcher: F) -> Result<WebSocketProvider<D>>
    where
        D: Dispatcher,
        F: FnOnce(ProviderContext) -> D,
    {
        let source = self.source.ok_or_else(|| {
            Error::config(
                "A socket source is required. Use .url(), .factory() or .source() to set it.\n\
                 Example: WebSocketProvider::builder().url(\"wss://node.example/ws\")",
            )
        })?;
        self.reconnect.validate()?;

        WebSocketProvider::assemble(source, self.network, self.reconnect, make_dispatcher)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct NullDispatcher;

    #[async_trait]
    impl Dispatcher for NullDispatcher {
        async fn start(&self) -> Result<()> {
            Ok(())
        }

        fn resume(&self) {}

        fn process_inbound_frame(&self, _frame: String) {}

        fn shutdown(&self) {}
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ProviderBuilder::new();
        assert!(builder.source.is_none());
        assert!(builder.network.is_none());
        assert_eq!(builder.reconnect, ReconnectPolicy::disabled());
    }

    #[test]
    fn test_url_sets_source() {
        let builder = ProviderBuilder::new().url("wss://node.example/ws");
        assert!(matches!(builder.source, Some(SocketSource::Url(ref u)) if u == "wss://node.example/ws"));
    }

    #[test]
    fn test_network_sets_descriptor() {
        let builder = ProviderBuilder::new().network(1u64);
        assert_eq!(builder.network, Some(Network::from_chain_id(1)));
    }

    #[test]
    fn test_build_without_source_fails() {
        let err = ProviderBuilder::new()
            .build(|_| NullDispatcher)
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_with_invalid_policy_fails() {
        let err = ProviderBuilder::new()
            .url("wss://node.example/ws")
            .reconnect(ReconnectPolicy::exponential().with_jitter(2.0))
            .build(|_| NullDispatcher)
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_with_bad_url_fails() {
        let err = ProviderBuilder::new()
            .url("ftp://node.example")
            .build(|_| NullDispatcher)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConstructionInput { .. }));
    }

    #[tokio::test]
    async fn test_build_passes_network_to_dispatcher() {
        let mut seen = None;
        let provider = ProviderBuilder::new()
            .url("ws://127.0.0.1:1")
            .network(Network::new("mainnet", 1))
            .build(|ctx| {
                seen = ctx.network.clone();
                NullDispatcher
            })
            .expect("provider");

        assert_eq!(seen, Some(Network::new("mainnet", 1)));
        assert!(provider.can_reconnect());
        provider.destroy();
    }
}
