//! Bridge from the `log` crate
//!
//! Routes `log::info!` and friends through a [`LoggerRegistry`]. A record's
//! `target` selects the category config when one is registered under that
//! name; otherwise the default config applies.

use crate::core::{global, Level, LogRecord, LoggerConfig, LoggerRegistry};
use log::{Log, Metadata, Record};
use std::sync::Arc;

/// `log::Log` implementation backed by a registry
#[derive(Debug, Clone)]
pub struct LogBridge {
    registry: Arc<LoggerRegistry>,
}

impl LogBridge {
    pub fn new(registry: Arc<LoggerRegistry>) -> Self {
        Self { registry }
    }

    fn config_for(&self, target: &str) -> Arc<LoggerConfig> {
        self.registry.get_config(target)
    }
}

impl Default for LogBridge {
    /// Bridge into the process-wide registry
    fn default() -> Self {
        Self::new(Arc::clone(global().registry()))
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config_for(metadata.target())
            .is_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &Record) {
        let config = self.config_for(record.target());
        let level = map_level(record.level());
        if !config.is_enabled(level) {
            return;
        }

        let mut entry = LogRecord::new(level, record.args().to_string());
        if let Some(file) = record.file() {
            entry = entry.with_location(file, record.line().unwrap_or(0));
        }
        config.dispatch(&entry);
    }

    fn flush(&self) {
        self.registry.default_config().flush();
        for category in self.registry.categories() {
            self.registry.get_config(&category).flush();
        }
    }
}

/// `log` has no fatal level; `Warn` maps to [`Level::Warning`]
pub fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warning,
        log::Level::Info => Level::Info,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

/// Install the bridge as the `log` crate's global logger
///
/// Level filtering is left to the configs, so the `log` max level is set to
/// `Trace`.
///
/// # Errors
///
/// Fails if another `log` implementation was installed first.
///
/// ```no_run
/// rust_sink_logger::bridge::init().expect("log bridge already installed");
/// log::info!(target: "db", "connected");
/// ```
pub fn init() -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::default()))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
