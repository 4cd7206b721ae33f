//! Round-trip benchmark suite.
//!
//! Measures send → echo → handler latency over the in-memory transport,
//! which isolates the connection's own overhead from the network:
//! - Payload sizes: 16 B, 1 KiB, 64 KiB
//! - Awaitable and callback send forms
//!
//! Run with: cargo bench --bench round_trip
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use websocket_client::{Connection, MemoryTransport};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PAYLOAD_SIZES: &[usize] = &[16, 1024, 64 * 1024];

// ============================================================================
// Benchmark: Awaitable Round Trip
// ============================================================================

fn bench_awaitable_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let mut group = c.benchmark_group("round_trip_await");
    group.measurement_time(Duration::from_secs(5));

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&rt).iter_custom(|iters| async move {
                let (transport, _peer) = MemoryTransport::echo();
                let (tx, mut rx) = mpsc::unbounded_channel();
                let connection = Connection::with_transport(transport, move |data| {
                    let _ = tx.send(data);
                })
                .expect("inside runtime");

                let payload = vec![0xAB_u8; size];
                let start = Instant::now();

                for _ in 0..iters {
                    connection
                        .send_binary(payload.clone())
                        .await
                        .expect("echo send");
                    black_box(rx.recv().await);
                }

                let elapsed = start.elapsed();
                connection.close();
                elapsed
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Callback Round Trip
// ============================================================================

fn bench_callback_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let mut group = c.benchmark_group("round_trip_callback");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("text", |b| {
        b.to_async(&rt).iter_custom(|iters| async move {
            let (transport, _peer) = MemoryTransport::echo();
            let (tx, mut rx) = mpsc::unbounded_channel();
            let connection = Connection::with_transport(transport, move |data| {
                let _ = tx.send(data);
            })
            .expect("inside runtime");

            let start = Instant::now();

            for _ in 0..iters {
                let (done_tx, done_rx) = oneshot::channel();
                connection.send_text_with("Hello world!", move |result| {
                    let _ = done_tx.send(result);
                });
                black_box(done_rx.await.expect("callback runs"));
                black_box(rx.recv().await);
            }

            let elapsed = start.elapsed();
            connection.close();
            elapsed
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_awaitable_round_trip,
    bench_callback_round_trip
);
criterion_main!(benches);
