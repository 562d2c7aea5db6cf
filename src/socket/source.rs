//! Construction inputs and connection factories.
//!
//! A provider can be built from four kinds of input, modelled by
//! [`SocketSource`] and resolved exactly once at construction:
//!
//! | Variant | Initial handle | Stored factory |
//! |---------|----------------|----------------|
//! | [`SocketSource::Url`] | `WebSocket::connect(url)` | reconnects to the same URL |
//! | [`SocketSource::Factory`] | one call to the factory | the factory itself |
//! | [`SocketSource::Native`] | the given [`WebSocket`] | returns the same handle again, never regenerates |
//! | [`SocketSource::Custom`] | the given handle | none |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};

use super::handle::{SharedSocket, SocketHandle};
use super::websocket::{WebSocket, parse_url};

// ============================================================================
// Types
// ============================================================================

/// Zero-argument producer of socket handles.
///
/// Every handle it returns must be connecting or open.
pub type SocketFactory = Arc<dyn Fn() -> Result<SharedSocket> + Send + Sync>;

// ============================================================================
// SocketSource
// ============================================================================

/// Input a provider is constructed from.
pub enum SocketSource {
    /// WebSocket endpoint address (`ws://` or `wss://`).
    Url(String),
    /// Factory that can be invoked again to reconnect.
    Factory(SocketFactory),
    /// Pre-built native handle.
    Native(Arc<WebSocket>),
    /// Any other handle implementation. Cannot be regenerated.
    Custom(SharedSocket),
}

impl SocketSource {
    /// Creates a source from an endpoint address.
    #[inline]
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Creates a source from a socket factory.
    #[must_use]
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<SharedSocket> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Creates a source from a custom handle.
    #[must_use]
    pub fn custom<S: SocketHandle>(handle: S) -> Self {
        Self::Custom(Arc::new(handle))
    }

    /// Resolves the source into its initial handle and optional factory.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConstructionInput`] for a bad URL or a handle that is
    ///   already closing or closed
    /// - Any error returned by a caller-supplied factory
    pub(crate) fn resolve(self) -> Result<ResolvedSocket> {
        match self {
            Self::Url(url) => {
                parse_url(&url)?;
                let factory: SocketFactory = Arc::new(move || {
                    WebSocket::connect(&url).map(|ws| Arc::new(ws) as SharedSocket)
                });
                let socket = produce(&factory)?;
                Ok(ResolvedSocket {
                    socket,
                    factory: Some(factory),
                    regenerates: true,
                })
            }

            Self::Factory(factory) => {
                let socket = produce(&factory)?;
                Ok(ResolvedSocket {
                    socket,
                    factory: Some(factory),
                    regenerates: true,
                })
            }

            Self::Native(ws) => {
                let socket: SharedSocket = ws;
                ensure_live(&socket)?;
                let reuse = Arc::clone(&socket);
                let factory: SocketFactory = Arc::new(move || Ok(Arc::clone(&reuse)));
                Ok(ResolvedSocket {
                    socket,
                    factory: Some(factory),
                    regenerates: false,
                })
            }

            Self::Custom(socket) => {
                ensure_live(&socket)?;
                Ok(ResolvedSocket {
                    socket,
                    factory: None,
                    regenerates: false,
                })
            }
        }
    }
}

impl fmt::Debug for SocketSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Native(ws) => f.debug_tuple("Native").field(ws).finish(),
            Self::Custom(socket) => f
                .debug_tuple("Custom")
                .field(&socket.ready_state())
                .finish(),
        }
    }
}

impl From<&str> for SocketSource {
    fn from(url: &str) -> Self {
        Self::Url(url.to_owned())
    }
}

impl From<String> for SocketSource {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<Url> for SocketSource {
    fn from(url: Url) -> Self {
        Self::Url(url.into())
    }
}

impl From<WebSocket> for SocketSource {
    fn from(ws: WebSocket) -> Self {
        Self::Native(Arc::new(ws))
    }
}

impl From<Arc<WebSocket>> for SocketSource {
    fn from(ws: Arc<WebSocket>) -> Self {
        Self::Native(ws)
    }
}

impl From<SharedSocket> for SocketSource {
    fn from(socket: SharedSocket) -> Self {
        Self::Custom(socket)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Result of resolving a [`SocketSource`].
pub(crate) struct ResolvedSocket {
    /// Initial live handle.
    pub(crate) socket: SharedSocket,
    /// Factory retained for the source, if any.
    pub(crate) factory: Option<SocketFactory>,
    /// Whether the factory yields a fresh handle on each call.
    pub(crate) regenerates: bool,
}

/// Invokes a factory and checks the handle it returns.
pub(crate) fn produce(factory: &SocketFactory) -> Result<SharedSocket> {
    let socket = factory()?;
    ensure_live(&socket)?;
    Ok(socket)
}

fn ensure_live(socket: &SharedSocket) -> Result<()> {
    let state = socket.ready_state();
    if state.is_live() {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "socket handle is already {state}"
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
