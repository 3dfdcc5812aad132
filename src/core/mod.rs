//! Core logger types and traits

pub mod config;
pub mod error;
pub mod formatter;
pub mod global;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod timestamp;

pub use config::{LoggerConfig, LoggerConfigBuilder};
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, JsonFormatter, TextFormatter};
pub use global::{global, GlobalContext};
pub use log_context::{FieldValue, LogContext};
pub use log_level::Level;
pub use log_record::LogRecord;
pub use logger::{CategoryLogger, Logger};
pub use metrics::SinkMetrics;
pub use overflow_policy::{DropPolicy, OverflowCallback};
pub use registry::LoggerRegistry;
pub use settings::{LoggerSettings, OutputFormat, QueuePolicy, QueueSettings, SinkSettings};
pub use sink::{Fallback, Sink};
pub use timestamp::TimestampStyle;
