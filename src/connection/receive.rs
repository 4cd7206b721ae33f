//! Receive loop.
//!
//! One task per connection issues a single `receive` at a time, hands the
//! decoded bytes to the handler, then re-arms unless the connection closed.
//! A new receive is only issued after the handler returns, which keeps
//! delivery ordered and never concurrent.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::identifiers::ConnectionId;
use crate::transport::{Transport, Unit};

use super::MessageHandler;

// ============================================================================
// Receive Loop
// ============================================================================

/// Runs until the connection closes or the transport fails.
///
/// A transport failure cancels the transport and stops the loop without
/// touching `closed`; only [`Connection::close`](super::Connection::close)
/// sets the flag.
pub(super) async fn run_receive_loop(
    id: ConnectionId,
    transport: Arc<dyn Transport>,
    closed: Arc<AtomicBool>,
    mut on_message: MessageHandler,
) {
    debug!(connection = %id, "Receive loop started");

    loop {
        let unit = match transport.receive().await {
            Ok(unit) => unit,
            Err(e) => {
                if closed.load(Ordering::Acquire) {
                    trace!(connection = %id, "Receive ended by close");
                } else {
                    debug!(connection = %id, error = %e, "Receive failed, stopping loop");
                    transport.cancel();
                }
                break;
            }
        };

        // Close may have landed while the receive was completing
        if closed.load(Ordering::Acquire) {
            trace!(connection = %id, kind = unit.kind(), "Dropping unit received after close");
            break;
        }

        dispatch(id, unit, &mut on_message);

        if closed.load(Ordering::Acquire) {
            break;
        }
    }

    debug!(connection = %id, "Receive loop terminated");
}

/// Forwards data units to the handler and drops everything else.
fn dispatch(id: ConnectionId, unit: Unit, on_message: &mut MessageHandler) {
    let kind = unit.kind();
    let len = unit.len();

    match unit.into_bytes() {
        Some(data) => {
            trace!(connection = %id, kind, len, "Delivering unit");
            on_message(data);
        }
        None => {
            debug!(connection = %id, kind, "Unsupported message type, dropping");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use tokio::time::timeout;

    use crate::connection::Connection;
    use crate::connection::test_support::{WAIT, assert_loop_finished, collector, next_message};
    use crate::transport::{MemoryTransport, Unit};

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (transport, peer) = MemoryTransport::pair();
        let (handler, mut rx) = collector();
        let _connection = Connection::with_transport(transport, handler).unwrap();

        peer.push("one");
        peer.push(vec![2u8, 2]);
        peer.push("three");

        assert_eq!(next_message(&mut rx).await, b"one");
        assert_eq!(next_message(&mut rx).await, vec![2u8, 2]);
        assert_eq!(next_message(&mut rx).await, b"three");
    }

    #[tokio::test]
    async fn test_text_is_normalized_to_utf8() {
        let (transport, peer) = MemoryTransport::pair();
        let (handler, mut rx) = collector();
        let _connection = Connection::with_transport(transport, handler).unwrap();

        peer.push("żółw 🐢");

        assert_eq!(next_message(&mut rx).await, "żółw 🐢".as_bytes());
    }

    #[tokio::test]
    async fn test_other_kinds_are_dropped_and_loop_continues() {
        let (transport, peer) = MemoryTransport::pair();
        let (handler, mut rx) = collector();
        let _connection = Connection::with_transport(transport, handler).unwrap();

        peer.push(Unit::Other("ping"));
        peer.push(Unit::Other("something-new"));
        peer.push("data");

        assert_eq!(next_message(&mut rx).await, b"data");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_delivery_after_close() {
        let (transport, peer) = MemoryTransport::pair();
        let (handler, mut rx) = collector();
        let connection = Connection::with_transport(transport, handler).unwrap();

        peer.push("before");
        assert_eq!(next_message(&mut rx).await, b"before");

        connection.close();
        peer.push("after");
        peer.push("later");

        assert_loop_finished(&mut rx).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_receive_in_flight() {
        let (transport, peer) = MemoryTransport::pair();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        // Handler blocks until released; nothing else may be delivered meanwhile
        let handler = move |data: Vec<u8>| {
            let _ = tx.send(data);
            let _ = release_rx.recv_timeout(Duration::from_secs(2));
        };
        let _connection = Connection::with_transport(transport, handler).unwrap();

        peer.push("first");
        peer.push("second");

        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, b"first");
        assert!(rx.try_recv().is_err());

        release_tx.send(()).unwrap();
        let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(second, b"second");
        release_tx.send(()).unwrap();
    }

    fn arb_unit() -> impl Strategy<Value = Unit> {
        prop_oneof![
            any::<String>().prop_map(Unit::Text),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(Unit::Binary),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_delivery_matches_transport_order(
            units in proptest::collection::vec(arb_unit(), 0..24)
        ) {
            let expected: Vec<Vec<u8>> = units
                .iter()
                .cloned()
                .filter_map(Unit::into_bytes)
                .collect();

            let delivered = tokio_test::block_on(async {
                let (transport, peer) = MemoryTransport::pair();
                let (handler, mut rx) = collector();
                let connection = Connection::with_transport(transport, handler).unwrap();

                for unit in units {
                    peer.push(unit);
                }

                let mut delivered = Vec::with_capacity(expected.len());
                for _ in 0..expected.len() {
                    delivered.push(next_message(&mut rx).await);
                }

                connection.close();
                delivered
            });

            prop_assert_eq!(delivered, expected);
        }
    }
}
