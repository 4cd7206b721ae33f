//! Builder pattern for connection configuration.
//!
//! Provides a fluent API for configuring and starting [`Connection`] instances.
//!
//! # Example
//!
//! ```no_run
//! use websocket_client::Connection;
//!
//! # async fn example() -> websocket_client::Result<()> {
//! let connection = Connection::builder()
//!     .url("wss://echo.websocket.org/")
//!     .header("Authorization", "Bearer token")
//!     .max_message_size(16 << 20)
//!     .build(|data| println!("{} bytes", data.len()))?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::transport::{TransportOptions, WebSocketTransport};

use super::Connection;

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Connection`].
///
/// Use [`Connection::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ConnectionBuilder {
    /// Target `ws://` or `wss://` URL.
    url: Option<String>,
    /// Transport tunables.
    options: TransportOptions,
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target URL.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a header to the opening handshake.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_header(name, value);
        self
    }

    /// Sets the maximum incoming message size in bytes.
    #[inline]
    #[must_use]
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.options = self.options.with_max_message_size(bytes);
        self
    }

    /// Sets the maximum incoming frame size in bytes.
    #[inline]
    #[must_use]
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.options = self.options.with_max_frame_size(bytes);
        self
    }

    /// Disables Nagle's algorithm on the socket.
    #[inline]
    #[must_use]
    pub fn disable_nagle(mut self) -> Self {
        self.options = self.options.with_nagle_disabled();
        self
    }

    /// Replaces all transport options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the configuration and starts the connection.
    ///
    /// Does not wait for the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no URL is set or the scheme is not `ws`/`wss`
    /// - [`Error::InvalidUrl`] if the URL does not parse
    /// - [`Error::InvalidArgument`] if a header is malformed
    /// - [`Error::NoRuntime`] if called outside a tokio runtime
    pub fn build<F>(self, on_message: F) -> Result<Connection>
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        let url = self.validate_url()?;
        let transport = WebSocketTransport::open(&url, self.options)?;

        Connection::with_transport(transport, on_message)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionBuilder {
    /// Validates the URL configuration.
    fn validate_url(&self) -> Result<String> {
        let url = self.url.clone().ok_or_else(|| {
            Error::config(
                "URL is required. Use .url() to set it.\n\
                 Example: Connection::builder().url(\"wss://example.com/socket\")",
            )
        })?;

        if url.trim().is_empty() {
            return Err(Error::config("URL must not be empty"));
        }

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
