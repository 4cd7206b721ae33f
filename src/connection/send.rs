//! Send methods.
//!
//! Every payload kind has an awaitable form and a callback form. Nothing is
//! queued or ordered here: concurrent sends go straight to the transport
//! and complete in whatever order it reports.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Result};
use crate::transport::Unit;

use super::Connection;

// ============================================================================
// Connection - Awaitable Sends
// ============================================================================

impl Connection {
    /// Encodes `value` as JSON and sends it as a binary message.
    ///
    /// Encoding happens before the transport is touched.
    ///
    /// # Errors
    ///
    /// - [`Error::Encoding`] if `value` fails to serialize
    /// - Any transport error from the send itself
    pub async fn send_json<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(value)?;
        self.send_unit(Unit::Binary(encoded)).await
    }

    /// Sends raw bytes as a binary message.
    ///
    /// # Errors
    ///
    /// Any transport error, [`Error::ConnectionClosed`] after close.
    pub async fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.send_unit(Unit::Binary(data.into())).await
    }

    /// Sends a text message.
    ///
    /// # Errors
    ///
    /// Any transport error, [`Error::ConnectionClosed`] after close.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_unit(Unit::Text(text.into())).await
    }

    async fn send_unit(&self, unit: Unit) -> Result<()> {
        trace!(connection = %self.id, kind = unit.kind(), len = unit.len(), "Sending");
        self.transport.send(unit).await
    }
}

// ============================================================================
// Connection - Callback Sends
// ============================================================================

impl Connection {
    /// Encodes `value` as JSON and sends it in the background.
    ///
    /// `on_complete` runs exactly once, with the encoding error if
    /// serialization fails (the transport is then never called), or with
    /// [`Error::NoRuntime`] if the runtime shut down before the send ran.
    pub fn send_json_with<T, F>(&self, value: T, on_complete: F)
    where
        T: Serialize + Send + 'static,
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let id = self.id;
        let completion = Completion::new(on_complete);

        self.runtime.spawn(async move {
            let result = match serde_json::to_vec(&value) {
                Ok(encoded) => transport.send(Unit::Binary(encoded)).await,
                Err(e) => {
                    trace!(connection = %id, error = %e, "Encoding failed");
                    Err(Error::Encoding(e))
                }
            };
            completion.complete(result);
        });
    }

    /// Sends raw bytes in the background.
    ///
    /// `on_complete` runs exactly once with the transport's result, or with
    /// [`Error::NoRuntime`] if the runtime shut down before the send ran.
    pub fn send_binary_with<F>(&self, data: impl Into<Vec<u8>>, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.dispatch(Unit::Binary(data.into()), on_complete);
    }

    /// Sends a text message in the background.
    ///
    /// `on_complete` runs exactly once with the transport's result, or with
    /// [`Error::NoRuntime`] if the runtime shut down before the send ran.
    pub fn send_text_with<F>(&self, text: impl Into<String>, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.dispatch(Unit::Text(text.into()), on_complete);
    }

    fn dispatch<F>(&self, unit: Unit, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        trace!(connection = %self.id, kind = unit.kind(), len = unit.len(), "Dispatching send");
        let completion = Completion::new(on_complete);

        self.runtime.spawn(async move {
            completion.complete(transport.send(unit).await);
        });
    }
}

// ============================================================================
// Completion
// ============================================================================

/// Owns a send callback and guarantees it runs once.
///
/// A spawned task can be dropped without being polled to completion, either
/// because the runtime was already shut down or because it shut down while
/// the send was pending. Dropping an unfinished `Completion` reports
/// [`Error::NoRuntime`].
struct Completion<F>
where
    F: FnOnce(Result<()>),
{
    on_complete: Option<F>,
}

impl<F> Completion<F>
where
    F: FnOnce(Result<()>),
{
    fn new(on_complete: F) -> Self {
        Self {
            on_complete: Some(on_complete),
        }
    }

    fn complete(mut self, result: Result<()>) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(result);
        }
    }
}

impl<F> Drop for Completion<F>
where
    F: FnOnce(Result<()>),
{
    fn drop(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            trace!("Send task dropped before completion");
            on_complete(Err(Error::NoRuntime));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
