//! WebSocket connection lifecycle.
//!
//! Each [`Connection`] owns one transport, one receive loop and the send
//! surface built on top of them.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Connection struct, construction, close and teardown |
//! | `receive` | Self-rescheduling receive loop |
//! | `send` | Awaitable and callback send methods |
//! | `builder` | Fluent connection configuration |
//!
//! # Lifecycle
//!
//! 1. `Connection::connect` / `ConnectionBuilder::build` - transport opened, loop spawned
//! 2. Inbound units flow transport → receive loop → handler, one at a time
//! 3. Outbound payloads flow caller → send surface → transport
//! 4. `Connection::close` (or drop) - transport cancelled, loop stops
//!
//! # Example
//!
//! ```no_run
//! use websocket_client::{Connection, Result};
//!
//! # async fn example() -> Result<()> {
//! let connection = Connection::connect("ws://127.0.0.1:9001", |data| {
//!     println!("received {} bytes", data.len());
//! })?;
//!
//! connection.send_text("Hello world!").await?;
//! connection.send_json(&serde_json::json!({ "op": "subscribe" })).await?;
//! connection.close();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod receive;
mod send;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use self::core::{Connection, MessageHandler};

// ============================================================================
// Test Helpers
// ============================================================================
