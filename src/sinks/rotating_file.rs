//! Rotating file sink
//!
//! Appends lines to a file and rotates it by size, age, or both. Backups
//! are named `<file>.1` (newest) through `<file>.N` (oldest). Filesystem
//! failures never reach the caller: the sink marks itself
//! [`SinkState::Degraded`], diverts the line to its fallback and retries on
//! the next write.

use crate::core::error::{LoggerError, Result};
use crate::core::{Fallback, Sink};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// When a [`RotatingFileSink`] starts a new file
///
/// A zero threshold never triggers.
///
/// # Examples
///
/// ```
/// use rust_sink_logger::sinks::RotationStrategy;
/// use std::time::Duration;
///
/// let hourly = RotationStrategy::time(Duration::from_secs(3600));
/// assert!(hourly.is_due(1, Duration::from_secs(3600)));
///
/// let capped = RotationStrategy::hybrid(64 * 1024, Duration::from_secs(86_400));
/// assert!(capped.is_due(64 * 1024, Duration::ZERO));
/// assert!(!capped.is_due(1024, Duration::from_secs(60)));
///
/// assert!(!RotationStrategy::size(0).is_due(u64::MAX, Duration::MAX));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStrategy {
    /// Rotate when the file reaches `max_bytes`
    Size { max_bytes: u64 },

    /// Rotate when `interval` has elapsed since first open or last rotation
    ///
    /// Reopening after a write error does not restart the interval.
    Time { interval: Duration },

    /// Rotate on whichever threshold is reached first
    Hybrid { max_bytes: u64, interval: Duration },

    /// No rotation
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl RotationStrategy {
    #[must_use]
    pub fn size(max_bytes: u64) -> Self {
        RotationStrategy::Size { max_bytes }
    }

    #[must_use]
    pub fn time(interval: Duration) -> Self {
        RotationStrategy::Time { interval }
    }

    #[must_use]
    pub fn hybrid(max_bytes: u64, interval: Duration) -> Self {
        RotationStrategy::Hybrid {
            max_bytes,
            interval,
        }
    }

    #[must_use]
    pub fn never() -> Self {
        RotationStrategy::Never
    }

    fn size_exceeded(max_bytes: u64, size: u64) -> bool {
        max_bytes > 0 && size >= max_bytes
    }

    fn age_exceeded(interval: Duration, age: Duration) -> bool {
        !interval.is_zero() && age >= interval
    }

    /// Whether a file of `size` bytes opened `age` ago must be rotated
    pub fn is_due(&self, size: u64, age: Duration) -> bool {
        match *self {
            RotationStrategy::Never => false,
            RotationStrategy::Size { max_bytes } => Self::size_exceeded(max_bytes, size),
            RotationStrategy::Time { interval } => Self::age_exceeded(interval, age),
            RotationStrategy::Hybrid {
                max_bytes,
                interval,
            } => Self::size_exceeded(max_bytes, size) || Self::age_exceeded(interval, age),
        }
    }
}

/// Configuration for [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use rust_sink_logger::sinks::{RotationPolicy, RotationStrategy};
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::hybrid(8 * 1024 * 1024, Duration::from_secs(86_400)))
///     .with_max_backups(7);
/// assert_eq!(policy.max_file_size(), Some(8 * 1024 * 1024));
///
/// // A retention of 0 disables rotation; the file grows unbounded
/// let unbounded = RotationPolicy::new().with_max_backups(0);
/// assert!(!unbounded.rotation_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub strategy: RotationStrategy,
    /// Backups kept as `<file>.1` ..= `<file>.N`; 0 disables rotation
    pub max_backups: usize,
    /// Flush the file after every line
    pub flush_on_write: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            max_backups: 5,
            flush_on_write: true,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Equivalent to `with_strategy(RotationStrategy::Size { max_bytes: size })`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes: size };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_flush_on_write(mut self, enabled: bool) -> Self {
        self.flush_on_write = enabled;
        self
    }

    /// Get the maximum file size if the strategy includes a size limit
    #[must_use]
    pub fn max_file_size(&self) -> Option<u64> {
        match self.strategy {
            RotationStrategy::Size { max_bytes } | RotationStrategy::Hybrid { max_bytes, .. } => {
                Some(max_bytes)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn rotation_enabled(&self) -> bool {
        self.max_backups > 0 && self.strategy != RotationStrategy::Never
    }
}

/// Observable state of a [`RotatingFileSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkState {
    /// File handle open and accepting writes
    Open = 0,
    /// Rotation in progress
    Rotating = 1,
    /// Last open, rotation or write failed; lines go to the fallback
    Degraded = 2,
}

impl SinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SinkState::Open,
            1 => SinkState::Rotating,
            _ => SinkState::Degraded,
        }
    }
}

struct OpenFile {
    writer: Option<BufWriter<File>>,
    size: u64,
    /// Start of the current file's age; survives reopening after an error
    started: Option<Instant>,
}

/// File sink with size/time based rotation
///
/// # Examples
///
/// ```no_run
/// use rust_sink_logger::sinks::{RotatingFileSink, RotationPolicy};
/// use rust_sink_logger::Sink;
///
/// let sink = RotatingFileSink::new(
///     "/var/log/app.log",
///     RotationPolicy::new().with_max_size(1024 * 1024).with_max_backups(3),
/// );
/// sink.write("service started");
/// ```
pub struct RotatingFileSink {
    path: PathBuf,
    policy: RotationPolicy,
    file: Mutex<OpenFile>,
    state: AtomicU8,
    rotations: AtomicU64,
    fallback: Fallback,
}

impl RotatingFileSink {
    /// Create the sink and try to open `path` for append
    ///
    /// Construction never fails: if the file cannot be opened the sink
    /// starts [`SinkState::Degraded`] and retries on the first write.
    pub fn new(path: impl AsRef<Path>, policy: RotationPolicy) -> Self {
        let sink = Self {
            path: path.as_ref().to_path_buf(),
            policy,
            file: Mutex::new(OpenFile {
                writer: None,
                size: 0,
                started: None,
            }),
            state: AtomicU8::new(SinkState::Open as u8),
            rotations: AtomicU64::new(0),
            fallback: Fallback::stderr(),
        };

        {
            let mut file = sink.file.lock();
            if let Err(e) = sink.ensure_open(&mut file) {
                sink.mark_degraded(&e);
            }
        }
        sink
    }

    /// Replace the channel receiving lines that could not reach the file
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Bytes in the current file as tracked by the sink
    pub fn current_size(&self) -> u64 {
        self.file.lock().size
    }

    /// Completed rotations since construction
    pub fn rotation_count(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Lines diverted to the fallback channel
    pub fn fallback_count(&self) -> u64 {
        self.fallback.count()
    }

    /// Path of the backup with the given index (`1` is the newest)
    #[must_use]
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.path.clone();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.log".to_string());
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn set_state(&self, state: SinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn mark_degraded(&self, error: &LoggerError) {
        let previous = self.state.swap(SinkState::Degraded as u8, Ordering::AcqRel);
        if SinkState::from_u8(previous) != SinkState::Degraded {
            eprintln!(
                "[LOGGER ERROR] {}. Writing to fallback until the file recovers.",
                error
            );
        }
    }

    fn open_file(&self) -> Result<(BufWriter<File>, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        #[cfg(feature = "file")]
        fs2::FileExt::try_lock_exclusive(&file)
            .map_err(|_| LoggerError::file_lock(self.path.display().to_string()))?;

        let size = file.metadata().map(|m| m.len()).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?;

        Ok((BufWriter::new(file), size))
    }

    fn ensure_open(&self, file: &mut OpenFile) -> Result<()> {
        if file.writer.is_none() {
            let (writer, size) = self.open_file()?;
            file.writer = Some(writer);
            file.size = size;
            file.started.get_or_insert_with(Instant::now);
        }
        Ok(())
    }

    fn should_rotate(&self, file: &OpenFile) -> bool {
        self.policy.rotation_enabled()
            && file.size > 0
            && self
                .policy
                .strategy
                .is_due(file.size, file.started.map_or(Duration::ZERO, |t| t.elapsed()))
    }

    fn rotation_error(&self, path: &Path, action: &str, e: io::Error) -> LoggerError {
        LoggerError::file_rotation(
            path.display().to_string(),
            format!("Failed to {}: {}", action, e),
        )
    }

    /// Close, shift backups oldest first, move the live file to `.1`, reopen
    fn rotate(&self, file: &mut OpenFile) -> Result<()> {
        if let Some(mut writer) = file.writer.take() {
            writer
                .flush()
                .map_err(|e| self.rotation_error(&self.path, "flush before rotation", e))?;
        }

        let oldest = self.backup_path(self.policy.max_backups);
        match fs::remove_file(&oldest) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.rotation_error(&oldest, "remove oldest backup", e)),
        }

        for i in (1..self.policy.max_backups).rev() {
            let from = self.backup_path(i);
            match fs::rename(&from, self.backup_path(i + 1)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(self.rotation_error(&from, "shift backup", e)),
            }
        }

        fs::rename(&self.path, self.backup_path(1))
            .map_err(|e| self.rotation_error(&self.path, "rotate current log file", e))?;

        file.started = None;
        self.ensure_open(file)?;
        self.rotations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn append(&self, file: &mut OpenFile, line: &str) -> Result<()> {
        let writer = file
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_sink(self.path.display().to_string(), "not open"))?;

        let result = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| {
                if self.policy.flush_on_write {
                    writer.flush()
                } else {
                    Ok(())
                }
            });

        match result {
            Ok(()) => {
                file.size += line.len() as u64 + 1;
                Ok(())
            }
            Err(e) => {
                file.writer = None;
                Err(LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to write log line: {}", e),
                ))
            }
        }
    }

    fn try_write(&self, file: &mut OpenFile, line: &str) -> Result<()> {
        self.ensure_open(file)?;

        if self.should_rotate(file) {
            self.set_state(SinkState::Rotating);
            self.rotate(file)?;
        }

        self.append(file, line)
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, line: &str) {
        let mut file = self.file.lock();
        match self.try_write(&mut file, line) {
            Ok(()) => self.set_state(SinkState::Open),
            Err(e) => {
                self.mark_degraded(&e);
                self.fallback.write_line(line);
            }
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock();
        if let Some(ref mut writer) = file.writer {
            if let Err(e) = writer.flush() {
                file.writer = None;
                self.mark_degraded(&LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                ));
            }
        }
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.file.get_mut().writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::SharedBuffer;
    use std::thread;
    use tempfile::tempdir;

    fn message(i: usize) -> String {
        // 29 characters, 30 bytes on disk with the newline
        format!("message number {:03} padding...", i)
    }

    #[test]
    fn test_rotation_strategy_constructors() {
        assert_eq!(RotationStrategy::size(1024), RotationStrategy::Size { max_bytes: 1024 });
        assert_eq!(
            RotationStrategy::time(Duration::from_secs(60)),
            RotationStrategy::Time {
                interval: Duration::from_secs(60)
            }
        );
        assert_eq!(RotationStrategy::never(), RotationStrategy::Never);
        assert_eq!(
            RotationStrategy::default(),
            RotationStrategy::Size {
                max_bytes: 10 * 1024 * 1024
            }
        );
    }

    #[test]
    fn test_zero_thresholds_never_trigger() {
        assert!(!RotationStrategy::size(0).is_due(u64::MAX, Duration::ZERO));
        assert!(!RotationStrategy::time(Duration::ZERO).is_due(0, Duration::from_secs(3600)));
        assert!(RotationStrategy::hybrid(0, Duration::from_millis(1)).is_due(1, Duration::from_secs(1)));
    }

    #[test]
    fn test_rotation_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_size(2048)
            .with_max_backups(10)
            .with_flush_on_write(false);

        assert_eq!(policy.max_file_size(), Some(2048));
        assert_eq!(policy.max_backups, 10);
        assert!(!policy.flush_on_write);
        assert!(policy.rotation_enabled());
        assert!(!policy.with_strategy(RotationStrategy::Never).rotation_enabled());
    }

    #[test]
    fn test_three_messages_over_fifty_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(50).with_max_backups(2),
        );

        for i in 0..3 {
            let line = message(i);
            assert_eq!(line.len() + 1, 30);
            sink.write(&line);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", message(2)));
        assert_eq!(
            fs::read_to_string(sink.backup_path(1)).unwrap(),
            format!("{}\n{}\n", message(0), message(1))
        );
        assert!(!sink.backup_path(2).exists());
        assert_eq!(sink.state(), SinkState::Open);
    }

    #[test]
    fn test_k_rotations_give_k_ordered_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("k.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(60).with_max_backups(5),
        );

        // Two 30-byte lines fill the file, the third write rotates
        for i in 0..8 {
            sink.write(&message(i));
        }

        assert_eq!(sink.rotation_count(), 3);
        assert!(sink.backup_path(3).exists());
        assert!(!sink.backup_path(4).exists());

        // Oldest slice in the highest index, slices disjoint
        assert_eq!(
            fs::read_to_string(sink.backup_path(3)).unwrap(),
            format!("{}\n{}\n", message(0), message(1))
        );
        assert_eq!(
            fs::read_to_string(sink.backup_path(1)).unwrap(),
            format!("{}\n{}\n", message(4), message(5))
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("{}\n{}\n", message(6), message(7))
        );
    }

    #[test]
    fn test_retention_limits_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(50).with_max_backups(2),
        );

        for i in 0..100 {
            sink.write(&message(i));
        }

        assert!(sink.backup_path(1).exists());
        assert!(sink.backup_path(2).exists());
        assert!(!sink.backup_path(3).exists());
    }

    #[test]
    fn test_zero_retention_disables_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unbounded.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(50).with_max_backups(0),
        );

        for i in 0..10 {
            sink.write(&message(i));
        }

        assert_eq!(sink.rotation_count(), 0);
        assert!(!sink.backup_path(1).exists());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 10);
    }

    #[test]
    fn test_time_based_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("time_rotation.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new()
                .with_strategy(RotationStrategy::time(Duration::from_millis(50)))
                .with_max_backups(3),
        );

        sink.write("Initial message");
        thread::sleep(Duration::from_millis(60));
        sink.write("After interval");

        assert_eq!(
            fs::read_to_string(sink.backup_path(1)).unwrap(),
            "Initial message\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "After interval\n");
    }

    #[test]
    fn test_reopen_keeps_file_age() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopened.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new()
                .with_strategy(RotationStrategy::time(Duration::from_millis(50)))
                .with_max_backups(2),
        );

        sink.write("Initial message");
        thread::sleep(Duration::from_millis(60));

        // Lose the handle the way a failed write does
        sink.file.lock().writer = None;
        sink.write("After reopen");

        assert_eq!(
            fs::read_to_string(sink.backup_path(1)).unwrap(),
            "Initial message\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "After reopen\n");
    }

    #[test]
    fn test_never_strategy_does_not_rotate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_strategy(RotationStrategy::Never),
        );

        for i in 0..50 {
            sink.write(&message(i));
        }
        assert!(!sink.backup_path(1).exists());
    }

    #[test]
    fn test_existing_file_size_is_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.log");
        fs::write(&path, "x".repeat(100)).unwrap();

        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(50).with_max_backups(1),
        );
        assert_eq!(sink.current_size(), 100);

        sink.write("fresh");
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
        assert_eq!(fs::read_to_string(sink.backup_path(1)).unwrap(), "x".repeat(100));
    }

    #[test]
    fn test_unopenable_path_degrades_to_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("app.log");
        let captured = SharedBuffer::new();
        let sink = RotatingFileSink::new(&path, RotationPolicy::new())
            .with_fallback(Fallback::new(Box::new(captured.clone())));

        assert_eq!(sink.state(), SinkState::Degraded);
        sink.write("nowhere to go");

        assert_eq!(sink.state(), SinkState::Degraded);
        assert_eq!(sink.fallback_count(), 1);
        assert_eq!(captured.contents(), "nowhere to go\n");
    }

    #[test]
    fn test_failed_rotation_degrades_then_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocked.log");
        let captured = SharedBuffer::new();
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_max_size(10).with_max_backups(1),
        )
        .with_fallback(Fallback::new(Box::new(captured.clone())));

        // A directory where the backup must go makes rotation fail
        fs::create_dir(sink.backup_path(1)).unwrap();

        sink.write("first line fills");
        sink.write("second line");

        assert_eq!(sink.state(), SinkState::Degraded);
        assert_eq!(captured.contents(), "second line\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "first line fills\n");

        fs::remove_dir(sink.backup_path(1)).unwrap();
        sink.write("third line");

        assert_eq!(sink.state(), SinkState::Open);
        assert_eq!(fs::read_to_string(&path).unwrap(), "third line\n");
        assert_eq!(
            fs::read_to_string(sink.backup_path(1)).unwrap(),
            "first line fills\n"
        );
    }

    #[cfg(all(unix, feature = "file"))]
    #[test]
    fn test_second_sink_on_same_path_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.log");

        let first = RotatingFileSink::new(&path, RotationPolicy::new());
        let second = RotatingFileSink::new(&path, RotationPolicy::new())
            .with_fallback(Fallback::new(Box::new(SharedBuffer::new())));

        assert_eq!(first.state(), SinkState::Open);
        assert_eq!(second.state(), SinkState::Degraded);

        second.write("rejected");
        first.write("accepted");
        assert_eq!(fs::read_to_string(&path).unwrap(), "accepted\n");
    }

    #[test]
    fn test_buffered_writes_reach_disk_on_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffered.log");
        let sink = RotatingFileSink::new(
            &path,
            RotationPolicy::new().with_flush_on_write(false),
        );

        sink.write("held back");
        sink.flush();
        assert_eq!(fs::read_to_string(&path).unwrap(), "held back\n");
    }
}
