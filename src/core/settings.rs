//! Declarative logger settings
//!
//! [`LoggerSettings`] is the serde shape a host application loads from its
//! own configuration file and turns into a [`LoggerConfig`].
//!
//! ```
//! use rust_sink_logger::LoggerSettings;
//!
//! let settings = LoggerSettings::from_json(r#"{
//!     "level": "debug",
//!     "format": "json",
//!     "timestamp": "iso8601",
//!     "sinks": [
//!         { "type": "stderr" },
//!         { "type": "stdout", "queue": { "capacity": 1024, "policy": "drop_oldest" } }
//!     ]
//! }"#).unwrap();
//!
//! let config = settings.build().unwrap();
//! assert_eq!(config.sinks().len(), 2);
//! assert_eq!(config.async_sinks().len(), 1);
//! ```

use super::config::{LoggerConfig, LoggerConfigBuilder};
use super::error::{LoggerError, Result};
use super::formatter::{Formatter, JsonFormatter, TextFormatter};
use super::log_level::Level;
use super::overflow_policy::DropPolicy;
use super::sink::Sink;
use super::timestamp::TimestampStyle;
use crate::sinks::{ConsoleSink, RotatingFileSink, RotationPolicy, RotationStrategy, StreamSink};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Overflow behaviour of a queued sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    #[default]
    DropNewest,
    DropOldest,
    Block,
}

/// Puts a sink behind an async queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSettings {
    pub capacity: usize,
    #[serde(default)]
    pub policy: QueuePolicy,
    /// Only used by `block`
    #[serde(default = "default_block_timeout_ms")]
    pub block_timeout_ms: u64,
}

fn default_block_timeout_ms() -> u64 {
    100
}

impl QueueSettings {
    pub fn drop_policy(&self) -> DropPolicy {
        match self.policy {
            QueuePolicy::DropNewest => DropPolicy::DropNewest,
            QueuePolicy::DropOldest => DropPolicy::DropOldest,
            QueuePolicy::Block => DropPolicy::Block(Duration::from_millis(self.block_timeout_ms)),
        }
    }
}

fn default_retention() -> usize {
    RotationPolicy::default().max_backups
}

/// One output destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SinkSettings {
    Stdout {
        #[serde(default)]
        queue: Option<QueueSettings>,
    },
    Stderr {
        #[serde(default)]
        queue: Option<QueueSettings>,
    },
    /// stdout for `Trace`..`Warning`, stderr for `Error` and `Fatal`
    Console {
        #[serde(default)]
        colors: bool,
        #[serde(default)]
        queue: Option<QueueSettings>,
    },
    /// Rotating file; with neither `max_size` nor `max_age_secs` it never rotates
    File {
        path: PathBuf,
        /// Rotate once the file reaches this many bytes
        #[serde(default)]
        max_size: Option<u64>,
        /// Rotate once the file has been open this many seconds
        #[serde(default)]
        max_age_secs: Option<u64>,
        #[serde(default = "default_retention")]
        retention: usize,
        #[serde(default = "default_flush_on_write")]
        flush_on_write: bool,
        #[serde(default)]
        queue: Option<QueueSettings>,
    },
}

fn default_flush_on_write() -> bool {
    true
}

impl SinkSettings {
    pub fn queue(&self) -> Option<&QueueSettings> {
        match self {
            SinkSettings::Stdout { queue }
            | SinkSettings::Stderr { queue }
            | SinkSettings::Console { queue, .. }
            | SinkSettings::File { queue, .. } => queue.as_ref(),
        }
    }

    fn open(&self) -> Box<dyn Sink> {
        match self {
            SinkSettings::Stdout { .. } => Box::new(StreamSink::stdout()),
            SinkSettings::Stderr { .. } => Box::new(StreamSink::stderr()),
            SinkSettings::Console { colors, .. } => {
                Box::new(ConsoleSink::stdio().with_colors(*colors))
            }
            SinkSettings::File {
                path,
                max_size,
                max_age_secs,
                retention,
                flush_on_write,
                ..
            } => {
                let strategy = match (max_size, max_age_secs) {
                    (Some(bytes), Some(secs)) => {
                        RotationStrategy::hybrid(*bytes, Duration::from_secs(*secs))
                    }
                    (Some(bytes), None) => RotationStrategy::size(*bytes),
                    (None, Some(secs)) => RotationStrategy::time(Duration::from_secs(*secs)),
                    (None, None) => RotationStrategy::never(),
                };
                let policy = RotationPolicy::new()
                    .with_strategy(strategy)
                    .with_max_backups(*retention)
                    .with_flush_on_write(*flush_on_write);
                Box::new(RotatingFileSink::new(path, policy))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(queue) = self.queue() {
            if queue.capacity == 0 {
                return Err(LoggerError::config(
                    "LoggerSettings",
                    "queue capacity must be greater than zero",
                ));
            }
        }
        if let SinkSettings::File { path, .. } = self {
            if path.as_os_str().is_empty() {
                return Err(LoggerError::config("LoggerSettings", "file sink path is empty"));
            }
        }
        Ok(())
    }
}

/// Serializable description of a [`LoggerConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerSettings {
    pub level: Level,
    pub format: OutputFormat,
    /// Defaults to `standard` for text and `iso8601` for JSON
    pub timestamp: Option<TimestampStyle>,
    /// Text format only
    pub prefix: Option<String>,
    pub sinks: Vec<SinkSettings>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: OutputFormat::Text,
            timestamp: None,
            prefix: None,
            sinks: vec![SinkSettings::Console {
                colors: false,
                queue: None,
            }],
        }
    }
}

impl LoggerSettings {
    /// Parse settings from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::JsonError`] for malformed input or unknown fields.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The formatter these settings describe
    pub fn formatter(&self) -> Arc<dyn Formatter> {
        match self.format {
            OutputFormat::Text => {
                let style = self.timestamp.clone().unwrap_or(TimestampStyle::Standard);
                let mut formatter = TextFormatter::new(style);
                if let Some(ref prefix) = self.prefix {
                    formatter = formatter.with_prefix(prefix.clone());
                }
                Arc::new(formatter)
            }
            OutputFormat::Json => Arc::new(JsonFormatter::new(
                self.timestamp.clone().unwrap_or(TimestampStyle::Iso8601),
            )),
        }
    }

    /// Open the described sinks and build the config
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for a zero queue
    /// capacity or an empty file path. Nothing is opened in that case.
    pub fn build(&self) -> Result<LoggerConfig> {
        for sink in &self.sinks {
            sink.validate()?;
        }

        let mut builder = LoggerConfigBuilder::new()
            .level(self.level)
            .shared_formatter(self.formatter());

        for settings in &self.sinks {
            let sink = settings.open();
            builder = match settings.queue() {
                Some(queue) => builder.boxed_async_sink(sink, queue.capacity, queue.drop_policy()),
                None => builder.shared_sink(Arc::from(sink)),
            };
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let settings = LoggerSettings::from_json("{}").unwrap();
        assert_eq!(settings, LoggerSettings::default());

        let config = settings.build().unwrap();
        assert_eq!(config.level(), Level::Info);
        assert_eq!(config.sinks().len(), 1);
    }

    #[test]
    fn test_level_names() {
        let settings = LoggerSettings::from_json(r#"{"level": "warn"}"#).unwrap();
        assert_eq!(settings.level, Level::Warning);

        let settings = LoggerSettings::from_json(r#"{"level": "fatal"}"#).unwrap();
        assert_eq!(settings.level, Level::Fatal);
    }

    #[test]
    fn test_file_sink_rotation_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let text = format!(
            r#"{{"sinks": [{{"type": "file", "path": {}, "max_size": 4096, "retention": 2}}]}}"#,
            serde_json::Value::from(path.to_string_lossy().into_owned())
        );

        let settings = LoggerSettings::from_json(&text).unwrap();
        match &settings.sinks[0] {
            SinkSettings::File {
                max_size,
                max_age_secs,
                retention,
                flush_on_write,
                ..
            } => {
                assert_eq!(*max_size, Some(4096));
                assert_eq!(*max_age_secs, None);
                assert_eq!(*retention, 2);
                assert!(*flush_on_write);
            }
            other => panic!("unexpected sink: {:?}", other),
        }

        let config = settings.build().unwrap();
        assert_eq!(config.sinks()[0].name(), "rotating_file");
        assert!(path.exists());
    }

    #[test]
    fn test_queue_policies() {
        let queue: QueueSettings =
            serde_json::from_str(r#"{"capacity": 8, "policy": "block", "block_timeout_ms": 250}"#)
                .unwrap();
        assert_eq!(queue.drop_policy(), DropPolicy::Block(Duration::from_millis(250)));

        let queue: QueueSettings = serde_json::from_str(r#"{"capacity": 8}"#).unwrap();
        assert_eq!(queue.drop_policy(), DropPolicy::DropNewest);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let settings = LoggerSettings::from_json(
            r#"{"sinks": [{"type": "stderr", "queue": {"capacity": 0}}]}"#,
        )
        .unwrap();

        let err = settings.build().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = LoggerSettings::from_json(r#"{"levle": "debug"}"#).unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));

        let err = LoggerSettings::from_json(r#"{"sinks": [{"type": "syslog"}]}"#).unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_formatter_selection() {
        use crate::core::LogRecord;

        let record = LogRecord::new(Level::Info, "hi");

        let text = LoggerSettings {
            timestamp: Some(TimestampStyle::None),
            prefix: Some("[svc]".to_string()),
            ..LoggerSettings::default()
        };
        assert_eq!(text.formatter().format(&record), "[svc] [INFO] hi");

        let json = LoggerSettings {
            format: OutputFormat::Json,
            timestamp: Some(TimestampStyle::None),
            ..LoggerSettings::default()
        };
        assert_eq!(
            json.formatter().format(&record),
            r#"{"level":"INFO","message":"hi"}"#
        );
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let settings = LoggerSettings::default();
        let text = settings.to_json().unwrap();
        assert_eq!(LoggerSettings::from_json(&text).unwrap(), settings);
    }
}
