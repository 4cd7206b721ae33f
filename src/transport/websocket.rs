//! tokio-tungstenite client transport.
//!
//! # Session Lifecycle
//!
//! 1. `WebSocketTransport::open` - validate URL, build handshake request
//! 2. First `receive`/`send` - dial and complete the handshake (shared);
//!    a dial abandoned by its caller is retried by the next one
//! 3. `receive`/`send` - read half and write half used independently
//! 4. `cancel` - fail all pending calls, send close frame in background

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{CancelSignal, Transport, TransportOptions, Unit};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Established session, split so reads never block writes.
struct Session {
    sink: AsyncMutex<SplitSink<WsStream, Message>>,
    stream: AsyncMutex<SplitStream<WsStream>>,
}

/// Outcome of the one-time handshake. Errors are kept as text so every
/// later caller can report them.
type SessionSlot = OnceCell<std::result::Result<Arc<Session>, String>>;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// WebSocket client transport backed by tokio-tungstenite.
///
/// Opening is lazy: [`open`](Self::open) only validates and prepares the
/// handshake, the socket is dialed by the first `receive` or `send`.
pub struct WebSocketTransport {
    /// Target URL, kept for log fields.
    url: String,
    /// Handshake request, cloned for each dial attempt.
    request: Request,
    /// Size limits and socket options.
    options: TransportOptions,
    /// Established session or the handshake error.
    session: SessionSlot,
    /// Cancellation flag.
    cancel: CancelSignal,
}

impl WebSocketTransport {
    /// Prepares a transport for `url` without dialing.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    /// - [`Error::InvalidArgument`] if a handshake header is malformed
    pub fn open(url: &str, options: TransportOptions) -> Result<Self> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Unsupported URL scheme '{}': expected ws or wss",
                parsed.scheme()
            )));
        }

        let mut request = parsed.as_str().into_client_request()?;
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_argument(format!("header name '{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_argument(format!("header value for '{name}': {e}")))?;
            request.headers_mut().append(header_name, header_value);
        }

        Ok(Self {
            url: parsed.into(),
            request,
            options,
            session: OnceCell::new(),
            cancel: CancelSignal::new(),
        })
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` once the handshake has completed successfully.
    #[inline]
    #[must_use]
    pub fn is_established(&self) -> bool {
        matches!(self.session.get(), Some(Ok(_)))
    }

    /// Returns the session, dialing on first use.
    async fn session(&self) -> Result<Arc<Session>> {
        self.session
            .get_or_init(|| self.handshake())
            .await
            .clone()
            .map_err(Error::connection)
    }

    /// Performs the opening handshake.
    ///
    /// If the calling future is dropped mid-dial the cell stays empty and
    /// the next caller dials again with a fresh copy of the request.
    async fn handshake(&self) -> std::result::Result<Arc<Session>, String> {
        debug!(url = %self.url, "Opening WebSocket session");

        let request = self.request.clone();
        let config = self.options.to_ws_config();
        match connect_async_with_config(request, Some(config), self.options.disable_nagle).await {
            Ok((ws_stream, response)) => {
                debug!(url = %self.url, status = %response.status(), "WebSocket session established");

                let (sink, stream) = ws_stream.split();
                Ok(Arc::new(Session {
                    sink: AsyncMutex::new(sink),
                    stream: AsyncMutex::new(stream),
                }))
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "WebSocket handshake failed");
                Err(e.to_string())
            }
        }
    }

    /// Reads the next message from the session.
    async fn read_next(&self) -> Result<Unit> {
        let session = self.session().await?;
        let mut stream = session.stream.lock().await;

        match stream.next().await {
            Some(Ok(message)) => Ok(Unit::from(message)),
            Some(Err(e)) => Err(Error::WebSocket(e)),
            None => Err(Error::ConnectionClosed),
        }
    }

    /// Writes one message to the session.
    async fn write(&self, message: Message) -> Result<()> {
        let session = self.session().await?;
        session.sink.lock().await.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn receive(&self) -> Result<Unit> {
        if self.cancel.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::ConnectionClosed),
            result = self.read_next() => result,
        }
    }

    async fn send(&self, unit: Unit) -> Result<()> {
        let message = match unit {
            Unit::Binary(data) => Message::binary(data),
            Unit::Text(text) => Message::text(text),
            Unit::Other(kind) => {
                return Err(Error::invalid_argument(format!(
                    "cannot send unit of kind '{kind}'"
                )));
            }
        };

        if self.cancel.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::ConnectionClosed),
            result = self.write(message) => result,
        }
    }

    fn cancel(&self) {
        if !self.cancel.cancel() {
            return;
        }

        debug!(url = %self.url, "Cancelling WebSocket session");

        let Some(Ok(session)) = self.session.get() else {
            return;
        };

        // Dropped outside a runtime: the socket closes with the transport
        let Ok(runtime) = Handle::try_current() else {
            trace!(url = %self.url, "No runtime, skipping close frame");
            return;
        };

        let session = Arc::clone(session);
        runtime.spawn(async move {
            let mut sink = session.sink.lock().await;
            if let Err(e) = sink.close().await {
                trace!(error = %e, "Close frame not sent");
            }
        });
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.url)
            .field("established", &self.is_established())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Message Conversion
// ============================================================================

impl From<Message> for Unit {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Self::Text(text.as_str().to_owned()),
            Message::Binary(data) => Self::Binary(data.to_vec()),
            Message::Ping(_) => Self::Other("ping"),
            Message::Pong(_) => Self::Other("pong"),
            Message::Close(_) => Self::Other("close"),
            Message::Frame(_) => Self::Other("frame"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
