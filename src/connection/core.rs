//! Core Connection struct, construction and closure.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::transport::Transport;

use super::builder::ConnectionBuilder;
use super::receive;

// ============================================================================
// Types
// ============================================================================

/// Message handler callback type.
///
/// Called once per inbound unit with its raw bytes (text arrives as
/// UTF-8). Only the receive loop calls it, never concurrently.
pub type MessageHandler = Box<dyn FnMut(Vec<u8>) + Send + 'static>;

// ============================================================================
// Connection
// ============================================================================

/// A single persistent WebSocket connection.
///
/// Construction starts the receive loop immediately; the handshake itself
/// completes in the background. Dropping the connection closes it.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. [`close`](Self::close) and the send
/// methods may be called from any task or thread.
pub struct Connection {
    /// Identifier used in log fields.
    pub(crate) id: ConnectionId,
    /// Exclusively owned transport (shared only with the receive loop).
    pub(crate) transport: Arc<dyn Transport>,
    /// Monotonic closed flag.
    pub(crate) closed: Arc<AtomicBool>,
    /// Runtime the receive loop and callback sends are spawned on.
    pub(crate) runtime: Handle,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a builder for configuring a connection.
    #[inline]
    #[must_use]
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Connects to `url` with default options.
    ///
    /// Returns as soon as the receive loop is spawned. An unreachable host
    /// is not an error here; it surfaces through later sends.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] / [`Error::Config`] if `url` is not a `ws`/`wss` URL
    /// - [`Error::NoRuntime`] if called outside a tokio runtime
    pub fn connect<F>(url: &str, on_message: F) -> Result<Self>
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        Self::builder().url(url).build(on_message)
    }

    /// Starts a connection over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] if called outside a tokio runtime.
    pub fn with_transport<T, F>(transport: T, on_message: F) -> Result<Self>
    where
        T: Transport,
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        Self::start(Arc::new(transport), Box::new(on_message))
    }

    /// Spawns the receive loop and returns the handle.
    fn start(transport: Arc<dyn Transport>, on_message: MessageHandler) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let id = ConnectionId::generate();
        let closed = Arc::new(AtomicBool::new(false));

        runtime.spawn(receive::run_receive_loop(
            id,
            Arc::clone(&transport),
            Arc::clone(&closed),
            on_message,
        ));

        debug!(connection = %id, "Connection started");

        Ok(Self {
            id,
            transport,
            closed,
            runtime,
        })
    }

    /// Returns the connection identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` once [`close`](Self::close) has run.
    ///
    /// A receive failure stops the loop but does not set this flag.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the connection.
    ///
    /// Idempotent and safe from any thread. Cancels the transport without
    /// waiting for outstanding operations; they fail on their own.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            trace!(connection = %self.id, "Close ignored, already closed");
            return;
        }

        self.transport.cancel();
        debug!(connection = %self.id, "Connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
