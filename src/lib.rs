//! WebSocket client - one persistent connection, one receive loop.
//!
//! This library wraps a single client-side WebSocket connection: it opens
//! the transport, keeps a receive loop running that hands every inbound
//! message to a caller-supplied handler, and exposes awaitable and
//! callback-based send methods for JSON, binary and text payloads.
//!
//! # Architecture
//!
//! - **Connection**: owns the transport and the closed flag; `close` is
//!   idempotent and also runs on drop
//! - **Receive loop**: one task, one receive in flight, ordered delivery
//! - **Send surface**: encode, then forward to the transport; no queueing
//! - **Transport**: handshake, framing and keepalive (tokio-tungstenite)
//!
//! # Quick Start
//!
//! ```no_run
//! use websocket_client::{Connection, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = Connection::connect("ws://127.0.0.1:9001", |data| {
//!         println!("{}", String::from_utf8_lossy(&data));
//!     })?;
//!
//!     connection.send_text("Hello world!").await?;
//!
//!     connection.send_text_with("Hello again!", |result| {
//!         if let Err(e) = result {
//!             eprintln!("send failed: {e}");
//!         }
//!     });
//!
//!     connection.close();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | [`Connection`] lifecycle, receive loop, sends |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`transport`] | [`Transport`] trait and implementations |
//!
//! # Receive Failures
//!
//! A transport error on the receive path stops the loop and cancels the
//! transport but leaves [`Connection::is_closed`] `false`; the flag is
//! reserved for [`Connection::close`]. Later sends fail with
//! [`Error::ConnectionClosed`].

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle, receive loop and send surface.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Transport contract and implementations.
///
/// Use [`MemoryTransport`] to test code built on [`Connection`].
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{Connection, ConnectionBuilder, MessageHandler};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Transport types
pub use transport::{
    MemoryPeer, MemoryTransport, Transport, TransportOptions, Unit, WebSocketTransport,
};
