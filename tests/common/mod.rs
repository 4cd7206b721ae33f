//! Local WebSocket echo server for integration tests.
//!
//! # Behaviour
//!
//! 1. Binds to `127.0.0.1:0` (random port)
//! 2. Sends a greeting text message after each handshake
//! 3. Echoes every text and binary message back
//! 4. Optionally closes right after the greeting

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Greeting sent to every client, like public echo services do.
pub const GREETING: &str = "Request served by local-echo";

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// EchoServer
// ============================================================================

/// A running echo server.
pub struct EchoServer {
    port: u16,
    headers: Arc<Mutex<Vec<(String, String)>>>,
}

impl EchoServer {
    /// Starts a server that greets and echoes.
    pub async fn start() -> anyhow::Result<Self> {
        Self::spawn(false).await
    }

    /// Starts a server that greets and then closes the connection.
    pub async fn start_closing() -> anyhow::Result<Self> {
        Self::spawn(true).await
    }

    async fn spawn(close_after_greeting: bool) -> anyhow::Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();
        let headers = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&headers);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, close_after_greeting, Arc::clone(&seen)));
            }
        });

        Ok(Self { port, headers })
    }

    /// Returns the WebSocket URL for this server.
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Returns the value of a handshake header seen by the server.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .lock()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

async fn serve(
    stream: TcpStream,
    close_after_greeting: bool,
    seen: Arc<Mutex<Vec<(String, String)>>>,
) {
    let record = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let mut seen = seen.lock();
        for (name, value) in request.headers() {
            if let Ok(value) = value.to_str() {
                seen.push((name.as_str().to_string(), value.to_string()));
            }
        }
        Ok(response)
    };

    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, record).await else {
        return;
    };

    if ws.send(Message::text(GREETING)).await.is_err() {
        return;
    }

    if close_after_greeting {
        let _ = ws.close(None).await;
        return;
    }

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                if ws.send(message).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Handler that forwards every message into a channel.
pub fn collector() -> (
    impl FnMut(Vec<u8>) + Send + 'static,
    mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |data: Vec<u8>| {
        let _ = tx.send(data);
    };
    (handler, rx)
}

/// Waits for the next delivered message as text.
pub async fn next_text(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> anyhow::Result<String> {
    let data = timeout(WAIT, rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("receive loop stopped"))?;
    Ok(String::from_utf8(data)?)
}

/// Waits until the receive loop has dropped its handler.
///
/// Returns the messages delivered before it stopped.
pub async fn drain_until_stopped(
    rx: &mut mpsc::UnboundedReceiver<Vec<u8>>,
) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut delivered = Vec::new();
    while let Some(data) = timeout(WAIT, rx.recv()).await? {
        delivered.push(data);
    }
    Ok(delivered)
}
