//! Process-wide default logger state
//!
//! One [`GlobalContext`] lives for the whole process behind [`global`]. It
//! owns the registry the [`Logger`](super::Logger) facade reads from and
//! the slots the default config is rebuilt from: threshold, console
//! streams, optional rotating file and optional formatter override.

use super::config::LoggerConfig;
use super::formatter::{Formatter, TextFormatter};
use super::log_level::Level;
use super::registry::LoggerRegistry;
use super::sink::Sink;
use crate::sinks::{ConsoleSink, RotatingFileSink, RotationPolicy};
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<GlobalContext> = LazyLock::new(GlobalContext::new);

/// The process-wide context
pub fn global() -> &'static GlobalContext {
    &GLOBAL
}

struct DefaultSlots {
    level: Level,
    console: Arc<dyn Sink>,
    file: Option<Arc<dyn Sink>>,
    formatter: Option<Arc<dyn Formatter>>,
}

impl DefaultSlots {
    fn initial() -> Self {
        Self {
            level: Level::Info,
            console: Arc::new(ConsoleSink::stdio()),
            file: None,
            formatter: None,
        }
    }

    fn to_config(&self) -> LoggerConfig {
        let mut sinks = vec![Arc::clone(&self.console)];
        if let Some(ref file) = self.file {
            sinks.push(Arc::clone(file));
        }
        let formatter = self
            .formatter
            .clone()
            .unwrap_or_else(|| Arc::new(TextFormatter::default()));
        LoggerConfig::from_parts(self.level, sinks, formatter)
    }
}

/// Default configuration slots plus the category registry
pub struct GlobalContext {
    registry: Arc<LoggerRegistry>,
    /// Serialises writers; readers go through the registry
    slots: Mutex<DefaultSlots>,
}

impl GlobalContext {
    fn new() -> Self {
        let slots = DefaultSlots::initial();
        Self {
            registry: Arc::new(LoggerRegistry::new(slots.to_config())),
            slots: Mutex::new(slots),
        }
    }

    pub fn registry(&self) -> &Arc<LoggerRegistry> {
        &self.registry
    }

    pub fn default_config(&self) -> Arc<LoggerConfig> {
        self.registry.default_config()
    }

    pub fn level(&self) -> Level {
        self.registry.default_config().level()
    }

    /// Change the default threshold, keeping the active sinks
    pub fn set_level(&self, level: Level) {
        let mut slots = self.slots.lock();
        slots.level = level;
        let current = self.registry.default_config();
        self.registry
            .replace_default(Arc::new(current.with_level(level)));
    }

    /// Override the default formatter; `None` restores the text formatter
    pub fn set_formatter(&self, formatter: Option<Arc<dyn Formatter>>) {
        let mut slots = self.slots.lock();
        slots.formatter = formatter.clone();
        let formatter = formatter.unwrap_or_else(|| Arc::new(TextFormatter::default()));
        let current = self.registry.default_config();
        self.registry
            .replace_default(Arc::new(current.with_formatter(formatter)));
    }

    /// Route default console output to `out`, and `Error`+ to `err`
    pub fn set_output_streams(&self, out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) {
        let mut slots = self.slots.lock();
        slots.console = Arc::new(ConsoleSink::new(out, err));
        self.rebuild(&slots);
    }

    /// Also write default output to a rotating file at `path`
    pub fn set_file_logging(&self, path: impl AsRef<Path>, policy: RotationPolicy) {
        let mut slots = self.slots.lock();
        // Close any previous file before the new sink opens (and locks) its path
        slots.file = None;
        self.rebuild(&slots);
        slots.file = Some(Arc::new(RotatingFileSink::new(path, policy)));
        self.rebuild(&slots);
    }

    pub fn clear_file_logging(&self) {
        let mut slots = self.slots.lock();
        slots.file = None;
        self.rebuild(&slots);
    }

    /// Install an explicit default config
    ///
    /// A later `set_output_streams`, `set_file_logging` or
    /// `clear_file_logging` rebuilds the default from its slots and replaces
    /// this config's sinks.
    pub fn configure(&self, config: LoggerConfig) {
        let mut slots = self.slots.lock();
        slots.level = config.level();
        self.registry.set_default(config);
    }

    /// Restore stdio output at `Info`, drop file logging and the formatter
    /// override, and remove every category config
    pub fn reset(&self) {
        let mut slots = self.slots.lock();
        *slots = DefaultSlots::initial();
        self.registry.clear();
        self.rebuild(&slots);
    }

    fn rebuild(&self, slots: &DefaultSlots) {
        self.registry.replace_default(Arc::new(slots.to_config()));
    }
}

impl std::fmt::Debug for GlobalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalContext")
            .field("registry", &self.registry)
            .finish()
    }
}
