//! WebSocket transport options.
//!
//! # Example
//!
//! ```
//! use websocket_client::TransportOptions;
//!
//! let options = TransportOptions::new()
//!     .with_max_message_size(1 << 20)
//!     .with_header("Authorization", "Bearer token")
//!     .with_nagle_disabled();
//!
//! assert_eq!(options.max_message_size, Some(1 << 20));
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

// ============================================================================
// TransportOptions
// ============================================================================

/// Tunables for [`WebSocketTransport`](super::WebSocketTransport).
///
/// `None` limits fall back to tungstenite's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Maximum size of an incoming message in bytes.
    pub max_message_size: Option<usize>,

    /// Maximum size of a single incoming frame in bytes.
    pub max_frame_size: Option<usize>,

    /// Set `TCP_NODELAY` on the underlying socket.
    pub disable_nagle: bool,

    /// Extra headers sent with the opening handshake.
    pub headers: Vec<(String, String)>,
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_message_size: None,
            max_frame_size: None,
            disable_nagle: false,
            headers: Vec::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Sets the maximum incoming message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Sets the maximum incoming frame size.
    #[inline]
    #[must_use]
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = Some(bytes);
        self
    }

    /// Disables Nagle's algorithm on the socket.
    #[inline]
    #[must_use]
    pub fn with_nagle_disabled(mut self) -> Self {
        self.disable_nagle = true;
        self
    }

    /// Adds a handshake header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Conversion
// ============================================================================

impl TransportOptions {
    /// Converts the size limits into a tungstenite config.
    #[must_use]
    pub(crate) fn to_ws_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();

        if let Some(bytes) = self.max_message_size {
            config = config.max_message_size(Some(bytes));
        }
        if let Some(bytes) = self.max_frame_size {
            config = config.max_frame_size(Some(bytes));
        }

        config
    }
}

// ============================================================================
// Tests
// ============================================================================
