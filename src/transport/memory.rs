//! In-process transport.
//!
//! [`MemoryTransport`] stands in for a real socket so caller code can be
//! exercised deterministically. The paired [`MemoryPeer`] plays the remote
//! end: it pushes inbound units, injects failures and inspects what was sent.
//!
//! # Example
//!
//! ```
//! use websocket_client::{Connection, MemoryTransport};
//!
//! # async fn example() -> websocket_client::Result<()> {
//! let (transport, peer) = MemoryTransport::echo();
//! let connection = Connection::with_transport(transport, |data| {
//!     println!("{}", String::from_utf8_lossy(&data));
//! })?;
//!
//! connection.send_text("Hello world!").await?;
//! assert_eq!(peer.send_attempts(), 1);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tracing::trace;

use crate::error::{Error, Result};

use super::{CancelSignal, Transport, Unit};

// ============================================================================
// Types
// ============================================================================

/// Inbound item: a unit or an injected receive failure.
type Inbound = std::result::Result<Unit, String>;

/// Counters and logs shared between transport and peer.
#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<Unit>>,
    send_attempts: AtomicUsize,
    cancellations: AtomicUsize,
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// In-process [`Transport`].
pub struct MemoryTransport {
    /// Units pushed by the peer (or echoed back).
    inbound: AsyncMutex<mpsc::UnboundedReceiver<Inbound>>,
    /// Loopback sender, present in echo mode.
    echo: Option<mpsc::UnboundedSender<Inbound>>,
    /// Send gate controlled by the peer; `true` lets sends through.
    gate: watch::Receiver<bool>,
    /// State visible to the peer.
    shared: Arc<Shared>,
    /// Cancellation flag.
    cancel: Arc<CancelSignal>,
}

impl MemoryTransport {
    /// Creates a transport and the peer that drives it.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        Self::build(false)
    }

    /// Creates a transport that re-delivers every sent unit inbound.
    #[must_use]
    pub fn echo() -> (Self, MemoryPeer) {
        Self::build(true)
    }

    fn build(echo: bool) -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (gate_tx, gate_rx) = watch::channel(true);
        let shared = Arc::new(Shared::default());
        let cancel = Arc::new(CancelSignal::new());

        let transport = Self {
            inbound: AsyncMutex::new(inbound_rx),
            echo: echo.then(|| inbound_tx.clone()),
            gate: gate_rx,
            shared: Arc::clone(&shared),
            cancel: Arc::clone(&cancel),
        };

        let peer = MemoryPeer {
            inbound: inbound_tx,
            gate: gate_tx,
            shared,
            cancel,
        };

        (transport, peer)
    }

    async fn next_inbound(&self) -> Result<Unit> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some(Ok(unit)) => Ok(unit),
            Some(Err(message)) => Err(Error::connection(message)),
            None => Err(Error::ConnectionClosed),
        }
    }

    async fn deliver(&self, unit: Unit) -> Result<()> {
        let mut gate = self.gate.clone();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| Error::ConnectionClosed)?;

        self.shared.sent.lock().push(unit.clone());

        if let Some(ref echo) = self.echo {
            echo.send(Ok(unit)).map_err(|_| Error::ConnectionClosed)?;
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn receive(&self) -> Result<Unit> {
        if self.cancel.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::ConnectionClosed),
            result = self.next_inbound() => result,
        }
    }

    async fn send(&self, unit: Unit) -> Result<()> {
        self.shared.send_attempts.fetch_add(1, Ordering::SeqCst);
        trace!(kind = unit.kind(), len = unit.len(), "Memory send");

        if self.cancel.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::ConnectionClosed),
            result = self.deliver(unit) => result,
        }
    }

    fn cancel(&self) {
        self.shared.cancellations.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("echo", &self.echo.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Remote end of a [`MemoryTransport`].
///
/// Dropping the peer ends the inbound stream (unless in echo mode) and
/// fails any send blocked on a paused gate.
#[derive(Debug)]
pub struct MemoryPeer {
    inbound: mpsc::UnboundedSender<Inbound>,
    gate: watch::Sender<bool>,
    shared: Arc<Shared>,
    cancel: Arc<CancelSignal>,
}

impl MemoryPeer {
    /// Queues a unit for the transport's next `receive`.
    ///
    /// Returns `false` if the transport has been dropped.
    pub fn push(&self, unit: impl Into<Unit>) -> bool {
        self.inbound.send(Ok(unit.into())).is_ok()
    }

    /// Makes the transport's next `receive` fail with `message`.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.inbound.send(Err(message.into())).is_ok()
    }

    /// Holds every subsequent send until [`resume_sends`](Self::resume_sends).
    pub fn pause_sends(&self) {
        self.gate.send_replace(false);
    }

    /// Releases held sends.
    pub fn resume_sends(&self) {
        self.gate.send_replace(true);
    }

    /// Returns every unit that completed a send, in completion order.
    #[must_use]
    pub fn sent(&self) -> Vec<Unit> {
        self.shared.sent.lock().clone()
    }

    /// Returns how many times `send` was called, successful or not.
    #[inline]
    #[must_use]
    pub fn send_attempts(&self) -> usize {
        self.shared.send_attempts.load(Ordering::SeqCst)
    }

    /// Returns how many times `cancel` was called.
    #[inline]
    #[must_use]
    pub fn cancellations(&self) -> usize {
        self.shared.cancellations.load(Ordering::SeqCst)
    }

    /// Returns `true` once the transport has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ============================================================================
// Tests
// ============================================================================
