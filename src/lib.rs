//! # Rust Sink Logger
//!
//! Leveled, structured logging that fans records out to pluggable sinks.
//!
//! ## Features
//!
//! - **Pluggable sinks**: streams, a stdout/stderr console pair and rotating files
//! - **Asynchronous delivery**: bounded queues with drop-newest, drop-oldest or
//!   block-with-timeout backpressure
//! - **File rotation**: size, age or both, with numbered backups and graceful
//!   degradation on filesystem errors
//! - **Per-category configuration**: a registry of immutable config snapshots
//!   with a process-wide default
//!
//! ## Quick start
//!
//! ```
//! use rust_sink_logger::prelude::*;
//! use rust_sink_logger::info;
//!
//! Logger::set_level(Level::Debug);
//! Logger::debug("cache warmed");
//! info!("listening on port {}", 8080);
//!
//! let db = Logger::get("db");
//! db.warning("slow query");
//! # Logger::reset();
//! ```

#[cfg(feature = "log-bridge")]
pub mod bridge;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        CategoryLogger, DropPolicy, FieldValue, Formatter, JsonFormatter, Level, LogContext,
        LogRecord, Logger, LoggerConfig, LoggerError, LoggerRegistry, LoggerSettings, Result,
        Sink, TextFormatter, TimestampStyle,
    };
    pub use crate::sinks::{
        AsyncSink, ConsoleSink, RotatingFileSink, RotationPolicy, RotationStrategy, StreamSink,
    };
}

pub use core::{
    CategoryLogger, DropPolicy, Fallback, FieldValue, Formatter, JsonFormatter, Level,
    LogContext, LogRecord, Logger, LoggerConfig, LoggerConfigBuilder, LoggerError,
    LoggerRegistry, LoggerSettings, OverflowCallback, Result, Sink, SinkMetrics, TextFormatter,
    TimestampStyle,
};
pub use sinks::{
    AsyncSink, ConsoleSink, RotatingFileSink, RotationPolicy, RotationStrategy, SharedBuffer,
    SinkState, StreamSink, DEFAULT_SHUTDOWN_TIMEOUT,
};
