//! Stream-backed sinks
//!
//! - [`StreamSink`]: any `Write` target (stdout, a file, a socket, a buffer)
//! - [`ConsoleSink`]: an output/error stream pair split by level
//! - [`SharedBuffer`]: cloneable in-memory `Write` target for capture

use crate::core::{Fallback, Level, Sink};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "console")]
use colored::Colorize;

type BoxedWriter = Box<dyn Write + Send>;

/// Write one line to `writer`, diverting to `fallback` on failure
fn write_or_divert(
    writer: &Mutex<BoxedWriter>,
    line: &str,
    fallback: &Fallback,
    failures: &AtomicU64,
) {
    let result = {
        let mut writer = writer.lock();
        writeln!(writer, "{}", line)
    };
    if result.is_err() {
        failures.fetch_add(1, Ordering::Relaxed);
        fallback.write_line(line);
    }
}

/// Sink writing each line to a single stream
///
/// # Example
///
/// ```
/// use rust_sink_logger::{Sink, sinks::{SharedBuffer, StreamSink}};
///
/// let buffer = SharedBuffer::new();
/// let sink = StreamSink::new(buffer.clone());
///
/// sink.write("hello");
/// assert_eq!(buffer.contents(), "hello\n");
/// ```
pub struct StreamSink {
    name: String,
    writer: Mutex<BoxedWriter>,
    fallback: Fallback,
    failures: AtomicU64,
}

impl StreamSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self::from_boxed(Box::new(writer))
    }

    pub fn from_boxed(writer: BoxedWriter) -> Self {
        Self {
            name: "stream".to_string(),
            writer: Mutex::new(writer),
            fallback: Fallback::stderr(),
            failures: AtomicU64::new(0),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout()).with_name("stdout")
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr()).with_name("stderr")
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the channel receiving lines the stream rejected
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of writes the stream rejected
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Sink for StreamSink {
    fn write(&self, line: &str) {
        write_or_divert(&self.writer, line, &self.fallback, &self.failures);
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Console sink routing `Error` and `Fatal` lines to the error stream
///
/// Everything below `Error` goes to the output stream. With the `console`
/// feature, lines can be coloured by level.
pub struct ConsoleSink {
    out: Mutex<BoxedWriter>,
    err: Mutex<BoxedWriter>,
    fallback: Fallback,
    failures: AtomicU64,
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new(out: BoxedWriter, err: BoxedWriter) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
            fallback: Fallback::stderr(),
            failures: AtomicU64::new(0),
            use_colors: false,
        }
    }

    /// Process stdout/stderr, coloured when stdout is a terminal
    pub fn stdio() -> Self {
        use std::io::IsTerminal;
        let use_colors = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), Box::new(io::stderr())).with_colors(use_colors)
    }

    /// Enable ANSI colours; ignored without the `console` feature
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors && cfg!(feature = "console");
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    #[cfg(feature = "console")]
    fn paint(&self, level: Level, line: &str) -> Option<String> {
        self.use_colors
            .then(|| line.color(level.color_code()).to_string())
    }

    #[cfg(not(feature = "console"))]
    fn paint(&self, _level: Level, _line: &str) -> Option<String> {
        debug_assert!(!self.use_colors);
        None
    }
}

impl Sink for ConsoleSink {
    fn write(&self, line: &str) {
        write_or_divert(&self.out, line, &self.fallback, &self.failures);
    }

    fn write_at(&self, level: Level, line: &str) {
        let painted = self.paint(level, line);
        let line = painted.as_deref().unwrap_or(line);
        let stream = if level.is_error() { &self.err } else { &self.out };
        write_or_divert(stream, line, &self.fallback, &self.failures);
    }

    fn flush(&self) {
        let _ = self.out.lock().flush();
        let _ = self.err.lock().flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Cloneable in-memory `Write` target
///
/// Clones share the same buffer, so one clone can be handed to a sink while
/// another inspects what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stream_sink_appends_newline() {
        let buffer = SharedBuffer::new();
        let sink = StreamSink::new(buffer.clone());

        sink.write("one");
        sink.write("two");

        assert_eq!(buffer.contents(), "one\ntwo\n");
        assert_eq!(buffer.lines(), vec!["one", "two"]);
    }

    #[test]
    fn test_stream_sink_failure_goes_to_fallback() {
        let captured = SharedBuffer::new();
        let sink = StreamSink::new(BrokenPipe)
            .with_fallback(Fallback::new(Box::new(captured.clone())));

        sink.write("lost line");

        assert_eq!(sink.failure_count(), 1);
        assert_eq!(captured.contents(), "lost line\n");
    }

    #[test]
    fn test_console_sink_splits_by_level() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let sink = ConsoleSink::new(Box::new(out.clone()), Box::new(err.clone()));

        sink.write_at(Level::Info, "info line");
        sink.write_at(Level::Warning, "warning line");
        sink.write_at(Level::Error, "error line");
        sink.write_at(Level::Fatal, "fatal line");

        assert_eq!(out.lines(), vec!["info line", "warning line"]);
        assert_eq!(err.lines(), vec!["error line", "fatal line"]);
    }

    #[test]
    fn test_console_sink_plain_write_goes_to_out() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let sink = ConsoleSink::new(Box::new(out.clone()), Box::new(err.clone()));

        sink.write("no level");

        assert_eq!(out.contents(), "no level\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_shared_buffer_clear() {
        let mut buffer = SharedBuffer::new();
        buffer.write_all(b"abc").unwrap();
        assert!(!buffer.is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
