//! Asynchronous sink decorator
//!
//! Wraps any sink with a bounded queue and a single consumer thread.
//! Producers never wait on the inner sink; when the queue is full the
//! [`DropPolicy`] decides what is lost.

use crate::core::error::{LoggerError, Result};
use crate::core::sink::{deliver_isolated, flush_isolated};
use crate::core::{DropPolicy, Level, OverflowCallback, Sink, SinkMetrics};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default shutdown timeout used when an async sink is dropped (5 seconds)
///
/// For custom timeout control, call [`AsyncSink::shutdown_timeout`] first.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct QueuedLine {
    level: Option<Level>,
    line: String,
}

#[derive(Default)]
struct Progress {
    /// Messages admitted by `write`, including those later dropped
    accepted: u64,
    /// Messages delivered, evicted or rejected
    retired: u64,
    consumer_exited: bool,
}

/// Shared between producers, the consumer and `flush`
#[derive(Default)]
struct Tracker {
    progress: Mutex<Progress>,
    changed: Condvar,
}

impl Tracker {
    fn accept(&self) {
        self.progress.lock().accepted += 1;
    }

    fn retire(&self) {
        self.progress.lock().retired += 1;
        self.changed.notify_all();
    }

    fn consumer_exited(&self) {
        self.progress.lock().consumer_exited = true;
        self.changed.notify_all();
    }

    /// Wait until everything accepted so far has been retired
    fn wait_drained(&self) {
        let mut progress = self.progress.lock();
        let target = progress.accepted;
        while progress.retired < target && !progress.consumer_exited {
            self.changed.wait(&mut progress);
        }
    }
}

/// Sink that hands lines to a background consumer thread
///
/// # Example
///
/// ```
/// use rust_sink_logger::sinks::{AsyncSink, SharedBuffer, StreamSink};
/// use rust_sink_logger::{DropPolicy, Sink};
///
/// let buffer = SharedBuffer::new();
/// let sink = AsyncSink::new(StreamSink::new(buffer.clone()), 1024, DropPolicy::DropNewest)
///     .unwrap();
///
/// sink.write("queued");
/// sink.flush();
/// assert_eq!(buffer.contents(), "queued\n");
///
/// sink.shutdown();
/// ```
pub struct AsyncSink {
    name: String,
    inner: Arc<dyn Sink>,
    sender: RwLock<Option<Sender<QueuedLine>>>,
    /// Producer-side handle on the queue, used to evict and to measure
    evictor: Receiver<QueuedLine>,
    worker: Mutex<Option<JoinHandle<()>>>,
    policy: DropPolicy,
    capacity: usize,
    metrics: Arc<SinkMetrics>,
    tracker: Arc<Tracker>,
    on_overflow: Option<OverflowCallback>,
}

impl AsyncSink {
    /// Wrap `inner` with a queue of `capacity` messages
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] if `capacity` is zero,
    /// or an I/O error if the consumer thread cannot be spawned.
    pub fn new(inner: impl Sink + 'static, capacity: usize, policy: DropPolicy) -> Result<Self> {
        Self::from_boxed(Box::new(inner), capacity, policy)
    }

    pub fn from_boxed(inner: Box<dyn Sink>, capacity: usize, policy: DropPolicy) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggerError::config(
                "AsyncSink",
                "capacity must be greater than zero",
            ));
        }

        let inner: Arc<dyn Sink> = Arc::from(inner);
        let (sender, receiver) = bounded::<QueuedLine>(capacity);
        let metrics = Arc::new(SinkMetrics::new());
        let tracker = Arc::new(Tracker::default());

        let worker = {
            let receiver = receiver.clone();
            let inner = Arc::clone(&inner);
            let metrics = Arc::clone(&metrics);
            let tracker = Arc::clone(&tracker);
            thread::Builder::new()
                .name(format!("async-sink-{}", inner.name()))
                .spawn(move || Self::consume(receiver, inner, metrics, tracker))
                .map_err(|e| {
                    LoggerError::io_operation(
                        "spawn async sink consumer",
                        "Failed to start consumer thread",
                        e,
                    )
                })?
        };

        Ok(Self {
            name: format!("async({})", inner.name()),
            inner,
            sender: RwLock::new(Some(sender)),
            evictor: receiver,
            worker: Mutex::new(Some(worker)),
            policy,
            capacity,
            metrics,
            tracker,
            on_overflow: None,
        })
    }

    /// Set a callback invoked with the running drop total on every drop
    #[must_use]
    pub fn with_overflow_callback(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Consumer loop: deliver in FIFO order until every sender is gone
    fn consume(
        receiver: Receiver<QueuedLine>,
        inner: Arc<dyn Sink>,
        metrics: Arc<SinkMetrics>,
        tracker: Arc<Tracker>,
    ) {
        for item in receiver.iter() {
            if deliver_isolated(inner.as_ref(), item.level, &item.line) {
                metrics.record_delivered();
            }
            tracker.retire();
        }
        flush_isolated(inner.as_ref());
        tracker.consumer_exited();
    }

    fn enqueue(&self, item: QueuedLine) {
        let sender_guard = self.sender.read();
        let Some(sender) = sender_guard.as_ref() else {
            drop(sender_guard);
            self.deliver_after_shutdown(item);
            return;
        };

        self.tracker.accept();
        let item = match sender.try_send(item) {
            Ok(()) => return,
            Err(TrySendError::Full(item)) => item,
            Err(TrySendError::Disconnected(item)) => {
                drop(sender_guard);
                self.tracker.retire();
                self.deliver_after_shutdown(item);
                return;
            }
        };

        self.metrics.record_queue_full();
        match self.policy {
            DropPolicy::DropNewest => self.drop_message(),
            DropPolicy::DropOldest => self.evict_and_send(sender, item),
            DropPolicy::Block(timeout) => {
                self.metrics.record_block();
                match sender.send_timeout(item, timeout) {
                    Ok(()) => {}
                    Err(SendTimeoutError::Timeout(_)) => self.drop_message(),
                    Err(SendTimeoutError::Disconnected(item)) => {
                        drop(sender_guard);
                        self.tracker.retire();
                        self.deliver_after_shutdown(item);
                    }
                }
            }
        }
    }

    /// Make room by discarding the oldest queued message
    fn evict_and_send(&self, sender: &Sender<QueuedLine>, mut item: QueuedLine) {
        loop {
            if self.evictor.try_recv().is_ok() {
                self.drop_message();
            }
            match sender.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => item = rejected,
                Err(TrySendError::Disconnected(rejected)) => {
                    self.tracker.retire();
                    self.deliver_after_shutdown(rejected);
                    return;
                }
            }
        }
    }

    fn drop_message(&self) {
        let total = self.metrics.record_dropped() + 1;
        self.tracker.retire();

        // Alert on first drop and periodically thereafter
        if total == 1 || total % 1000 == 0 {
            let hint = if self.policy.is_blocking() {
                "Consider a longer block timeout or a larger queue."
            } else {
                "Consider increasing capacity."
            };
            eprintln!(
                "[LOGGER WARNING] Async queue for '{}' full at {} entries, {} messages dropped ({} policy). {}",
                self.inner.name(),
                self.capacity(),
                total,
                self.policy,
                hint
            );
        }

        if let Some(ref callback) = self.on_overflow {
            callback(total);
        }
    }

    fn deliver_after_shutdown(&self, item: QueuedLine) {
        self.metrics.record_sync_fallback();
        if deliver_isolated(self.inner.as_ref(), item.level, &item.line) {
            self.metrics.record_delivered();
        }
    }

    /// Number of messages dropped by the policy so far
    pub fn dropped_count(&self) -> u64 {
        self.metrics.dropped_count()
    }

    /// Messages currently waiting in the queue
    pub fn queue_size(&self) -> usize {
        self.evictor.len()
    }

    /// Maximum number of queued messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Whether the queue still accepts messages
    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Stop accepting, drain the queue and join the consumer
    ///
    /// Idempotent. Writes arriving afterwards are delivered synchronously
    /// on the caller's thread.
    pub fn shutdown(&self) {
        drop(self.sender.write().take());

        if let Some(handle) = self.worker.lock().take() {
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] Async sink consumer panicked during shutdown: {:?}", e);
            }
        }
        flush_isolated(self.inner.as_ref());
    }

    /// Like [`AsyncSink::shutdown`] but gives up waiting after `timeout`
    ///
    /// Returns `true` if the consumer drained and exited in time. On
    /// timeout the consumer keeps draining in the background and a later
    /// `shutdown` joins it.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        drop(self.sender.write().take());

        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            let start = Instant::now();

            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[LOGGER ERROR] Async sink consumer panicked during shutdown: {:?}",
                            e
                        );
                        return false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Async sink '{}' did not drain within {:?}. \
                         Some messages may be lost.",
                        self.inner.name(),
                        timeout
                    );
                    *worker = Some(handle);
                    return false;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
        drop(worker);

        flush_isolated(self.inner.as_ref());
        true
    }
}

impl Sink for AsyncSink {
    fn write(&self, line: &str) {
        self.enqueue(QueuedLine {
            level: None,
            line: line.to_string(),
        });
    }

    fn write_at(&self, level: Level, line: &str) {
        self.enqueue(QueuedLine {
            level: Some(level),
            line: line.to_string(),
        });
    }

    /// Block until every message accepted before the call reached the inner sink
    fn flush(&self) {
        self.tracker.wait_drained();
        flush_isolated(self.inner.as_ref());
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        self.shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT);

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Async sink '{}' shutting down with {} dropped messages (drop rate: {:.2}%)",
                self.inner.name(),
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{SharedBuffer, StreamSink};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Inner sink that holds every write until the gate opens
    #[derive(Clone, Default)]
    struct GatedSink {
        lines: Arc<Mutex<Vec<String>>>,
        gate: Arc<(Mutex<bool>, Condvar)>,
    }

    impl GatedSink {
        fn open(&self) {
            let (open, cv) = &*self.gate;
            *open.lock() = true;
            cv.notify_all();
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl Sink for GatedSink {
        fn write(&self, line: &str) {
            let (open, cv) = &*self.gate;
            let mut open = open.lock();
            while !*open {
                cv.wait(&mut open);
            }
            drop(open);
            self.lines.lock().push(line.to_string());
        }

        fn flush(&self) {}

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn wait_until_empty(sink: &AsyncSink) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while sink.queue_size() > 0 {
            assert!(Instant::now() < deadline, "consumer never picked up the warm-up line");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Park the consumer on `m0`, then write m1..=count into the queue
    fn fill_behind_stalled_consumer(sink: &AsyncSink, count: usize) {
        sink.write("m0");
        wait_until_empty(sink);
        for i in 1..=count {
            sink.write(&format!("m{}", i));
        }
    }

    fn expected(range: impl Iterator<Item = usize>) -> Vec<String> {
        range.map(|i| format!("m{}", i)).collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = AsyncSink::new(GatedSink::default(), 0, DropPolicy::DropNewest);
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_drop_newest_discards_incoming() {
        let inner = GatedSink::default();
        let sink = AsyncSink::new(inner.clone(), 4, DropPolicy::DropNewest).unwrap();

        fill_behind_stalled_consumer(&sink, 5);
        assert_eq!(sink.dropped_count(), 1);
        assert_eq!(sink.queue_size(), sink.capacity());

        inner.open();
        sink.flush();

        let mut want = vec!["m0".to_string()];
        want.extend(expected(1..=4));
        assert_eq!(inner.lines(), want);
        assert_eq!(sink.metrics().queue_full_events(), 1);
    }

    #[test]
    fn test_drop_oldest_evicts_first_queued() {
        let inner = GatedSink::default();
        let sink = AsyncSink::new(inner.clone(), 4, DropPolicy::DropOldest).unwrap();

        fill_behind_stalled_consumer(&sink, 5);
        assert_eq!(sink.dropped_count(), 1);

        inner.open();
        sink.flush();

        let mut want = vec!["m0".to_string()];
        want.extend(expected(2..=5));
        assert_eq!(inner.lines(), want);
    }

    #[test]
    fn test_block_times_out_then_drops() {
        let inner = GatedSink::default();
        let sink = AsyncSink::new(
            inner.clone(),
            2,
            DropPolicy::Block(Duration::from_millis(50)),
        )
        .unwrap();

        let start = Instant::now();
        fill_behind_stalled_consumer(&sink, 3);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(sink.dropped_count(), 1);
        assert_eq!(sink.metrics().block_events(), 1);

        inner.open();
        sink.flush();
        assert_eq!(inner.lines(), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_block_succeeds_when_space_frees() {
        let inner = GatedSink::default();
        let sink = AsyncSink::new(inner.clone(), 2, DropPolicy::Block(Duration::from_secs(5)))
            .unwrap();

        let opener = {
            let inner = inner.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                inner.open();
            })
        };

        fill_behind_stalled_consumer(&sink, 3);
        opener.join().unwrap();
        sink.flush();

        assert_eq!(sink.dropped_count(), 0);
        assert_eq!(inner.lines(), vec!["m0", "m1", "m2", "m3"]);
    }

    #[test]
    fn test_flush_waits_for_delivery() {
        for n in [0usize, 1, 100, 1000] {
            let buffer = SharedBuffer::new();
            let sink = AsyncSink::new(StreamSink::new(buffer.clone()), 16, DropPolicy::Block(Duration::from_secs(5)))
                .unwrap();

            for i in 0..n {
                sink.write(&format!("line {}", i));
            }
            sink.flush();

            assert_eq!(buffer.lines().len(), n);
        }
    }

    #[test]
    fn test_writes_after_shutdown_are_synchronous() {
        let buffer = SharedBuffer::new();
        let sink = AsyncSink::new(StreamSink::new(buffer.clone()), 8, DropPolicy::DropNewest)
            .unwrap();

        sink.write("before");
        sink.shutdown();
        sink.shutdown();
        assert!(!sink.is_running());
        assert_eq!(buffer.lines(), vec!["before"]);

        sink.write("after");
        assert_eq!(buffer.lines(), vec!["before", "after"]);
        assert_eq!(sink.metrics().sync_fallbacks(), 1);
        assert!(sink.shutdown_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_fifo_per_producer_under_concurrency() {
        let buffer = SharedBuffer::new();
        let sink = Arc::new(
            AsyncSink::new(StreamSink::new(buffer.clone()), 4096, DropPolicy::DropNewest).unwrap(),
        );

        let producers: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for seq in 0..250 {
                        sink.write(&format!("{} {}", t, seq));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        sink.flush();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1000);
        let mut last = [-1i64; 4];
        for line in lines {
            let mut parts = line.split(' ');
            let t: usize = parts.next().unwrap().parse().unwrap();
            let seq: i64 = parts.next().unwrap().parse().unwrap();
            assert!(seq > last[t], "producer {} out of order", t);
            last[t] = seq;
        }
    }

    #[test]
    fn test_panicking_inner_does_not_stop_consumer() {
        struct Fragile(SharedBuffer);

        impl Sink for Fragile {
            fn write(&self, line: &str) {
                if line == "boom" {
                    panic!("inner sink failure");
                }
                StreamSink::new(self.0.clone()).write(line);
            }

            fn flush(&self) {}

            fn name(&self) -> &str {
                "fragile"
            }
        }

        let buffer = SharedBuffer::new();
        let sink = AsyncSink::new(Fragile(buffer.clone()), 8, DropPolicy::DropNewest).unwrap();

        sink.write("boom");
        sink.write("after");
        sink.flush();

        assert_eq!(buffer.lines(), vec!["after"]);
        assert_eq!(sink.metrics().delivered_count(), 1);
    }

    #[test]
    fn test_overflow_callback_receives_running_total() {
        let inner = GatedSink::default();
        let seen = Arc::new(AtomicU64::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            AsyncSink::new(inner.clone(), 1, DropPolicy::DropNewest)
                .unwrap()
                .with_overflow_callback(Arc::new(move |total| {
                    seen.store(total, Ordering::Relaxed);
                }))
        };

        fill_behind_stalled_consumer(&sink, 4);
        assert_eq!(seen.load(Ordering::Relaxed), 3);

        inner.open();
        sink.flush();
    }

    #[test]
    fn test_level_is_forwarded_to_inner() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let console = crate::sinks::ConsoleSink::new(Box::new(out.clone()), Box::new(err.clone()));
        let sink = AsyncSink::new(console, 8, DropPolicy::DropNewest).unwrap();

        sink.write_at(Level::Info, "fine");
        sink.write_at(Level::Error, "broken");
        sink.flush();

        assert_eq!(out.lines(), vec!["fine"]);
        assert_eq!(err.lines(), vec!["broken"]);
    }
}
