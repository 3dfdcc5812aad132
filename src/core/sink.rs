//! Sink trait for log output destinations

use super::log_level::Level;
use parking_lot::Mutex;
use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

/// A destination accepting rendered log lines
///
/// Sinks synchronise internally and are shared as `Arc<dyn Sink>`, so every
/// method takes `&self`. `write` never reports failure to the caller: an
/// implementation that cannot reach its destination recovers locally and
/// hands the line to its [`Fallback`].
///
/// # Example
///
/// ```
/// use rust_sink_logger::Sink;
/// use parking_lot::Mutex;
///
/// struct VecSink(Mutex<Vec<String>>);
///
/// impl Sink for VecSink {
///     fn write(&self, line: &str) {
///         self.0.lock().push(line.to_string());
///     }
///
///     fn flush(&self) {}
///
///     fn name(&self) -> &str {
///         "vec"
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// Write one line; the sink appends its own line terminator
    fn write(&self, line: &str);

    /// Write one line knowing its severity
    ///
    /// Sinks that split output by level override this; the rest inherit
    /// plain [`Sink::write`].
    fn write_at(&self, level: Level, line: &str) {
        let _ = level;
        self.write(line);
    }

    /// Force out anything buffered
    fn flush(&self);

    fn name(&self) -> &str;
}

/// Secondary channel receiving lines a sink failed to deliver
///
/// Defaults to stderr. Tests inject an in-memory writer to observe what
/// was diverted.
pub struct Fallback {
    writer: Mutex<Box<dyn Write + Send>>,
    writes: AtomicU64,
}

impl Fallback {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            writes: AtomicU64::new(0),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Divert a line; errors here have nowhere left to go and are ignored
    pub fn write_line(&self, line: &str) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }

    /// Number of lines diverted so far
    pub fn count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for Fallback {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallback")
            .field("writes", &self.count())
            .finish()
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Write to a sink, containing any panic it raises
///
/// Lines without a level go through plain [`Sink::write`]. Returns `false`
/// if the sink panicked; other sinks keep receiving lines.
pub(crate) fn deliver_isolated(sink: &dyn Sink, level: Option<Level>, line: &str) -> bool {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match level {
        Some(level) => sink.write_at(level, line),
        None => sink.write(line),
    }));
    match result {
        Ok(()) => true,
        Err(payload) => {
            eprintln!(
                "[LOGGER CRITICAL] Sink '{}' panicked: {}. Other sinks continue to function.",
                sink.name(),
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

/// Flush a sink, containing any panic it raises
pub(crate) fn flush_isolated(sink: &dyn Sink) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.flush())) {
        eprintln!(
            "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
            sink.name(),
            panic_message(payload.as_ref())
        );
    }
}
