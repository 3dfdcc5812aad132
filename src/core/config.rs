//! Immutable logger configuration snapshots
//!
//! A [`LoggerConfig`] bundles a level threshold, the sinks a record fans out
//! to, and the formatter rendering it. Configs are built once and shared as
//! `Arc<LoggerConfig>`; changing anything means building a new snapshot.

use super::error::Result;
use super::formatter::{Formatter, TextFormatter};
use super::log_level::Level;
use super::log_record::LogRecord;
use super::overflow_policy::{DropPolicy, OverflowCallback};
use super::sink::{deliver_isolated, flush_isolated, Sink};
use crate::sinks::{AsyncSink, ConsoleSink, RotatingFileSink, RotationPolicy, StreamSink};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Level threshold, sinks and formatter used to emit records
#[derive(Clone)]
pub struct LoggerConfig {
    level: Level,
    sinks: Vec<Arc<dyn Sink>>,
    async_sinks: Vec<Arc<AsyncSink>>,
    formatter: Arc<dyn Formatter>,
}

impl LoggerConfig {
    #[must_use]
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::new()
    }

    /// `Info` threshold writing text lines to stdout/stderr
    pub fn console() -> Self {
        Self {
            level: Level::Info,
            sinks: vec![Arc::new(ConsoleSink::stdio())],
            async_sinks: Vec::new(),
            formatter: Arc::new(TextFormatter::default()),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }

    pub fn async_sinks(&self) -> &[Arc<AsyncSink>] {
        &self.async_sinks
    }

    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Format `record` once and hand the line to every sink
    ///
    /// Does not check the level; callers filter first so nothing is built
    /// for discarded records.
    pub fn dispatch(&self, record: &LogRecord) {
        if self.sinks.is_empty() {
            return;
        }
        let line = self.formatter.format(record);
        for sink in &self.sinks {
            deliver_isolated(sink.as_ref(), Some(record.level), &line);
        }
    }

    /// Level-check and dispatch a prebuilt record
    pub fn submit(&self, record: &LogRecord) {
        if self.is_enabled(record.level) {
            self.dispatch(record);
        }
    }

    /// Flush every sink; async sinks drain first
    pub fn flush(&self) {
        for sink in &self.sinks {
            flush_isolated(sink.as_ref());
        }
    }

    /// Total messages dropped across this config's async sinks
    pub fn dropped_count(&self) -> u64 {
        self.async_sinks.iter().map(|s| s.dropped_count()).sum()
    }

    /// Drain async sinks only
    pub fn flush_async(&self) {
        for sink in &self.async_sinks {
            sink.flush();
        }
    }

    /// Shut down async sinks; later writes to them are synchronous
    pub fn shutdown_async(&self) {
        for sink in &self.async_sinks {
            sink.shutdown();
        }
    }

    /// Assemble a config from already-running synchronous sinks
    pub(crate) fn from_parts(
        level: Level,
        sinks: Vec<Arc<dyn Sink>>,
        formatter: Arc<dyn Formatter>,
    ) -> Self {
        Self {
            level,
            sinks,
            async_sinks: Vec::new(),
            formatter,
        }
    }

    /// Same sinks and formatter with a different threshold
    pub(crate) fn with_level(&self, level: Level) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    /// Same sinks and threshold with a different formatter
    pub(crate) fn with_formatter(&self, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            formatter,
            ..self.clone()
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::console()
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("level", &self.level)
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

enum PendingSink {
    Ready(Arc<dyn Sink>),
    Queued {
        inner: Box<dyn Sink>,
        capacity: usize,
        policy: DropPolicy,
    },
}

/// Builder for [`LoggerConfig`]
///
/// `build` consumes the builder, so nothing done afterwards can reach a
/// config that was already built. Async sinks are started by `build`.
///
/// # Example
///
/// ```
/// use rust_sink_logger::prelude::*;
/// use rust_sink_logger::sinks::SharedBuffer;
///
/// let buffer = SharedBuffer::new();
/// let config = LoggerConfig::builder()
///     .level(Level::Debug)
///     .stream_sink(buffer.clone())
///     .formatter(JsonFormatter::default())
///     .build()
///     .unwrap();
///
/// assert!(config.is_enabled(Level::Debug));
/// assert!(!config.is_enabled(Level::Trace));
/// ```
pub struct LoggerConfigBuilder {
    level: Level,
    sinks: Vec<PendingSink>,
    formatter: Option<Arc<dyn Formatter>>,
    on_overflow: Option<OverflowCallback>,
}

impl LoggerConfigBuilder {
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            sinks: Vec::new(),
            formatter: None,
            on_overflow: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Add a sink owned by this config
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(PendingSink::Ready(Arc::new(sink)));
        self
    }

    /// Add a sink that is also shared elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(PendingSink::Ready(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn stream_sink(self, writer: impl Write + Send + 'static) -> Self {
        self.sink(StreamSink::new(writer))
    }

    /// Add an output/error stream pair split by level
    #[must_use = "builder methods return a new value"]
    pub fn console_sink(
        self,
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
    ) -> Self {
        self.sink(ConsoleSink::new(Box::new(out), Box::new(err)))
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_stream_sink(
        self,
        writer: impl Write + Send + 'static,
        capacity: usize,
        policy: DropPolicy,
    ) -> Self {
        self.async_sink(StreamSink::new(writer), capacity, policy)
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_sink(self, path: impl Into<PathBuf>, rotation: RotationPolicy) -> Self {
        self.sink(RotatingFileSink::new(path.into(), rotation))
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_file_sink(
        self,
        path: impl Into<PathBuf>,
        rotation: RotationPolicy,
        capacity: usize,
        policy: DropPolicy,
    ) -> Self {
        self.async_sink(RotatingFileSink::new(path.into(), rotation), capacity, policy)
    }

    /// Wrap `inner` in an [`AsyncSink`] when the config is built
    #[must_use = "builder methods return a new value"]
    pub fn async_sink(self, inner: impl Sink + 'static, capacity: usize, policy: DropPolicy) -> Self {
        self.boxed_async_sink(Box::new(inner), capacity, policy)
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_async_sink(
        mut self,
        inner: Box<dyn Sink>,
        capacity: usize,
        policy: DropPolicy,
    ) -> Self {
        self.sinks.push(PendingSink::Queued {
            inner,
            capacity,
            policy,
        });
        self
    }

    /// Callback for drops on any async sink this builder creates
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(self, formatter: impl Formatter + 'static) -> Self {
        self.shared_formatter(Arc::new(formatter))
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Build the config, starting any async sinks
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`](super::LoggerError::InvalidConfiguration)
    /// if an async sink was given zero capacity.
    pub fn build(self) -> Result<LoggerConfig> {
        let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(self.sinks.len());
        let mut async_sinks = Vec::new();

        for pending in self.sinks {
            match pending {
                PendingSink::Ready(sink) => sinks.push(sink),
                PendingSink::Queued {
                    inner,
                    capacity,
                    policy,
                } => {
                    let mut sink = AsyncSink::from_boxed(inner, capacity, policy)?;
                    if let Some(ref callback) = self.on_overflow {
                        sink = sink.with_overflow_callback(Arc::clone(callback));
                    }
                    let sink = Arc::new(sink);
                    sinks.push(Arc::clone(&sink) as Arc<dyn Sink>);
                    async_sinks.push(sink);
                }
            }
        }

        Ok(LoggerConfig {
            level: self.level,
            sinks,
            async_sinks,
            formatter: self
                .formatter
                .unwrap_or_else(|| Arc::new(TextFormatter::default())),
        })
    }
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
