//! Asynchronous logging example
//!
//! Demonstrates async sinks with the three overflow policies and their
//! metrics.
//!
//! Run with: cargo run --example async_logging

use rust_sink_logger::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - Async Logging Example ===\n");

    println!("1. High-throughput logging with a blocking queue:");
    let config = LoggerConfig::builder()
        .async_stream_sink(std::io::sink(), 1024, DropPolicy::Block(Duration::from_millis(100)))
        .build()?;

    let start = Instant::now();
    for i in 0..10_000 {
        config.submit(&LogRecord::new(Level::Info, format!("Message {}", i)));
    }
    config.flush_async();
    println!("   10000 messages in {:?}, dropped: {}", start.elapsed(), config.dropped_count());

    println!("\n2. Concurrent producers:");
    let config = Arc::new(config);
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                for i in 0..1000 {
                    config.submit(&LogRecord::new(
                        Level::Info,
                        format!("Thread {} message {}", t, i),
                    ));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    config.flush_async();
    for sink in config.async_sinks() {
        let metrics = sink.metrics();
        println!(
            "   delivered: {}, dropped: {}, queue-full events: {}",
            metrics.delivered_count(),
            metrics.dropped_count(),
            metrics.queue_full_events()
        );
    }

    println!("\n3. Drop policies on a tiny queue:");
    for policy in [DropPolicy::DropNewest, DropPolicy::DropOldest] {
        let alerts = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&alerts);
        let sink = AsyncSink::new(StreamSink::new(std::io::sink()), 4, policy)?
            .with_overflow_callback(Arc::new(move |_total| {
                counter.fetch_add(1, Ordering::Relaxed);
            }));

        for i in 0..1000 {
            sink.write(&format!("burst {}", i));
        }
        sink.flush();
        println!(
            "   {}: dropped {}, callback fired {} times",
            policy,
            sink.dropped_count(),
            alerts.load(Ordering::Relaxed)
        );
        sink.shutdown();
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
