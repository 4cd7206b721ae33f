//! Transport layer.
//!
//! The [`Connection`](crate::Connection) only orchestrates; the actual
//! handshake, framing and keepalive live behind the [`Transport`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Connection     │   receive() / send(Unit)     │  Transport      │
//! │                 │─────────────────────────────►│                 │
//! │  receive loop   │◄─────────────────────────────│  WebSocket or   │
//! │  send surface   │          cancel()            │  in-memory      │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Transport Contract
//!
//! 1. `receive` - one unit per call, single-shot
//! 2. `send` - may run concurrently with an in-flight `receive`
//! 3. `cancel` - synchronous, idempotent; afterwards every pending and
//!    future call fails with [`Error::ConnectionClosed`]
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | tokio-tungstenite client transport |
//! | `memory` | In-process transport for tests and benchmarks |
//! | `options` | Tunables for the WebSocket transport |

// ============================================================================
// Submodules
// ============================================================================

/// In-process transport.
pub mod memory;

/// Transport options.
pub mod options;

/// tokio-tungstenite client transport.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::watch;

#[cfg(doc)]
use crate::error::Error;
use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryPeer, MemoryTransport};
pub use options::TransportOptions;
pub use websocket::WebSocketTransport;

// ============================================================================
// Unit
// ============================================================================

/// One discrete message as delivered to or accepted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Opaque binary payload.
    Binary(Vec<u8>),
    /// UTF-8 text payload.
    Text(String),
    /// Any other kind (ping, pong, close, raw frame, ...).
    ///
    /// Tolerated on receive and never forwarded to the message handler.
    Other(&'static str),
}

impl Unit {
    /// Returns a short name for the unit kind, used in log fields.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Text(_) => "text",
            Self::Other(kind) => kind,
        }
    }

    /// Returns the payload length in bytes, `0` for [`Unit::Other`].
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(data) => data.len(),
            Self::Text(text) => text.len(),
            Self::Other(_) => 0,
        }
    }

    /// Returns `true` if the unit carries no payload bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalizes the unit to the bytes handed to the message handler.
    ///
    /// Text becomes its UTF-8 encoding. Returns `None` for [`Unit::Other`].
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Binary(data) => Some(data),
            Self::Text(text) => Some(text.into_bytes()),
            Self::Other(_) => None,
        }
    }
}

impl From<Vec<u8>> for Unit {
    #[inline]
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

impl From<String> for Unit {
    #[inline]
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Unit {
    #[inline]
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

// ============================================================================
// Transport
// ============================================================================

/// The collaborator a [`Connection`](crate::Connection) rides on.
///
/// Implementations must allow `send` to proceed while a `receive` is
/// suspended, and must make `cancel` safe to call from any thread,
/// including from `Drop` outside a runtime.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Waits for the next inbound unit.
    ///
    /// # Errors
    ///
    /// Any socket or session failure, including [`Error::ConnectionClosed`]
    /// after [`cancel`](Self::cancel).
    async fn receive(&self) -> Result<Unit>;

    /// Sends one unit and waits for the transport to accept it.
    ///
    /// # Errors
    ///
    /// Any socket or session failure, including [`Error::ConnectionClosed`]
    /// after [`cancel`](Self::cancel).
    async fn send(&self, unit: Unit) -> Result<()>;

    /// Terminates the session immediately. Best effort, never fails.
    fn cancel(&self);

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    fn is_cancelled(&self) -> bool;
}

// ============================================================================
// CancelSignal
// ============================================================================

/// One-way cancellation flag that async operations can race against.
#[derive(Debug)]
pub(crate) struct CancelSignal {
    tx: watch::Sender<bool>,
}

impl CancelSignal {
    /// Creates a signal in the not-cancelled state.
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Trips the signal. Returns `true` only for the first call.
    pub(crate) fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    /// Returns `true` once the signal has been tripped.
    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been tripped.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns on cancellation
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
