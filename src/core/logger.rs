//! Logger facade
//!
//! [`Logger`] exposes static entry points against the process-wide default
//! config; [`Logger::get`] hands out [`CategoryLogger`] handles bound to a
//! category name. Every call checks the level before a record is built or
//! formatted.

use super::config::LoggerConfig;
use super::formatter::Formatter;
use super::global::global;
use super::log_context::LogContext;
use super::log_level::Level;
use super::log_record::{substitute, LogRecord};
use super::registry::LoggerRegistry;
use crate::sinks::RotationPolicy;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Build and dispatch a record only if `config` accepts `level`
#[inline]
fn emit(config: &LoggerConfig, level: Level, build: impl FnOnce() -> LogRecord) {
    if config.is_enabled(level) {
        config.dispatch(&build());
    }
}

/// Static logging facade over the process-wide default config
///
/// # Example
///
/// ```
/// use rust_sink_logger::prelude::*;
///
/// Logger::info("Server started");
/// Logger::log_fmt(Level::Warning, "{} of {} workers busy", &[&7, &8]);
/// Logger::log_with_context(
///     Level::Info,
///     "request done",
///     LogContext::new().with_field("status", 200),
/// );
///
/// let db = Logger::get("db");
/// db.debug("not shown at the default Info threshold");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    /// The active default config
    #[inline]
    pub fn config() -> Arc<LoggerConfig> {
        global().default_config()
    }

    /// Config for `category`, or the default if none is registered
    #[inline]
    pub fn category_config(category: &str) -> Arc<LoggerConfig> {
        global().registry().get_config(category)
    }

    #[inline]
    pub fn trace(message: impl Into<String>) {
        Self::log(Level::Trace, message);
    }

    #[inline]
    pub fn debug(message: impl Into<String>) {
        Self::log(Level::Debug, message);
    }

    #[inline]
    pub fn info(message: impl Into<String>) {
        Self::log(Level::Info, message);
    }

    #[inline]
    pub fn warning(message: impl Into<String>) {
        Self::log(Level::Warning, message);
    }

    #[inline]
    pub fn error(message: impl Into<String>) {
        Self::log(Level::Error, message);
    }

    #[inline]
    pub fn fatal(message: impl Into<String>) {
        Self::log(Level::Fatal, message);
    }

    pub fn log(level: Level, message: impl Into<String>) {
        emit(&Self::config(), level, || LogRecord::new(level, message));
    }

    /// Log with an explicit source location
    pub fn log_at(level: Level, message: impl Into<String>, file: &str, line: u32) {
        emit(&Self::config(), level, || {
            LogRecord::new(level, message).with_location(file, line)
        });
    }

    /// Log with structured key/value context, rendered in insertion order
    pub fn log_with_context(level: Level, message: impl Into<String>, context: LogContext) {
        emit(&Self::config(), level, || {
            LogRecord::new(level, message).with_context(context)
        });
    }

    /// Log with positional `{}` substitution
    ///
    /// Surplus arguments are appended separated by spaces; placeholders
    /// without an argument stay as `{}`.
    pub fn log_fmt(level: Level, template: &str, args: &[&dyn Display]) {
        emit(&Self::config(), level, || {
            LogRecord::new(level, substitute(template, args))
        });
    }

    /// Dispatch a prebuilt record through the default config
    pub fn submit(record: LogRecord) {
        Self::config().submit(&record);
    }

    /// Submit to `category` if it has a config, otherwise to the default
    pub fn submit_to(category: &str, record: LogRecord) {
        Self::category_config(category).submit(&record);
    }

    pub fn is_enabled(level: Level) -> bool {
        Self::config().is_enabled(level)
    }

    /// Handle bound to `category`
    pub fn get(category: impl Into<String>) -> CategoryLogger {
        CategoryLogger::new(Arc::clone(global().registry()), category)
    }

    /// Flush every sink of the default config
    pub fn flush() {
        Self::config().flush();
    }

    /// Replace the default config
    pub fn configure(config: LoggerConfig) {
        global().configure(config);
    }

    pub fn set_level(level: Level) {
        global().set_level(level);
    }

    pub fn level() -> Level {
        global().level()
    }

    /// Override the default formatter; `None` restores the text formatter
    pub fn set_formatter(formatter: Option<Arc<dyn Formatter>>) {
        global().set_formatter(formatter);
    }

    pub fn set_output_streams(out: impl Write + Send + 'static, err: impl Write + Send + 'static) {
        global().set_output_streams(Box::new(out), Box::new(err));
    }

    pub fn set_file_logging(path: impl AsRef<Path>, policy: RotationPolicy) {
        global().set_file_logging(path, policy);
    }

    pub fn clear_file_logging() {
        global().clear_file_logging();
    }

    /// Restore the process-wide defaults and drop every category config
    pub fn reset() {
        global().reset();
    }

    /// Messages dropped by async sinks of the default and category configs
    pub fn async_dropped_count() -> u64 {
        let registry = global().registry();
        registry.default_config().dropped_count()
            + registry
                .categories()
                .iter()
                .map(|name| registry.get_config(name).dropped_count())
                .sum::<u64>()
    }

    /// Drain async sinks of the default and category configs
    pub fn async_flush() {
        let registry = global().registry();
        registry.default_config().flush_async();
        for name in registry.categories() {
            registry.get_config(&name).flush_async();
        }
    }

    /// Shut down async sinks of the default and category configs
    pub fn async_shutdown() {
        let registry = global().registry();
        registry.default_config().shutdown_async();
        for name in registry.categories() {
            registry.get_config(&name).shutdown_async();
        }
    }

    pub fn registry() -> Arc<LoggerRegistry> {
        Arc::clone(global().registry())
    }
}

/// Logger handle for one category
///
/// The category's config is looked up on every call, so a later
/// `set_config` for the category takes effect on existing handles.
#[derive(Debug, Clone)]
pub struct CategoryLogger {
    registry: Arc<LoggerRegistry>,
    category: Arc<str>,
}

impl CategoryLogger {
    /// Bind a handle to `category` in an explicit registry
    pub fn new(registry: Arc<LoggerRegistry>, category: impl Into<String>) -> Self {
        Self {
            registry,
            category: Arc::from(category.into()),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The config this handle currently resolves to
    pub fn config(&self) -> Arc<LoggerConfig> {
        self.registry.get_config(&self.category)
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(Level::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[inline]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Level::Fatal, message);
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        emit(&self.config(), level, || LogRecord::new(level, message));
    }

    pub fn log_at(&self, level: Level, message: impl Into<String>, file: &str, line: u32) {
        emit(&self.config(), level, || {
            LogRecord::new(level, message).with_location(file, line)
        });
    }

    pub fn log_with_context(&self, level: Level, message: impl Into<String>, context: LogContext) {
        emit(&self.config(), level, || {
            LogRecord::new(level, message).with_context(context)
        });
    }

    pub fn log_fmt(&self, level: Level, template: &str, args: &[&dyn Display]) {
        emit(&self.config(), level, || {
            LogRecord::new(level, substitute(template, args))
        });
    }

    pub fn submit(&self, record: LogRecord) {
        self.config().submit(&record);
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.config().is_enabled(level)
    }

    pub fn flush(&self) {
        self.config().flush();
    }
}
