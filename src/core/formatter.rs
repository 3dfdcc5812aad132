//! Formatters turning a [`LogRecord`] into a single output line
//!
//! - [`TextFormatter`]: human-readable line (default)
//! - [`JsonFormatter`]: one JSON object per line
//!
//! Formatting never fails. Missing pieces (no location, empty message, no
//! timestamp) simply shorten the line.

use super::log_record::LogRecord;
use super::timestamp::TimestampStyle;
use std::fmt;

/// Renders a record into the line handed to every sink
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> Formatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

impl fmt::Debug for dyn Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter")
    }
}

/// Human-readable line formatter
///
/// Layout: `[prefix ][[timestamp] ][LEVEL] message[ (file:line)][ key=value ...]`
///
/// # Example
///
/// ```
/// use rust_sink_logger::{Formatter, Level, LogRecord, TextFormatter, TimestampStyle};
///
/// let formatter = TextFormatter::new(TimestampStyle::None).with_prefix("app");
/// let record = LogRecord::new(Level::Info, "started").with_location("src/main.rs", 12);
/// assert_eq!(formatter.format(&record), "app [INFO] started (main.rs:12)");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFormatter {
    timestamp_style: TimestampStyle,
    prefix: Option<String>,
}

impl TextFormatter {
    pub fn new(timestamp_style: TimestampStyle) -> Self {
        Self {
            timestamp_style,
            prefix: None,
        }
    }

    /// Literal text placed at the start of every line
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn timestamp_style(&self) -> &TimestampStyle {
        &self.timestamp_style
    }

    /// Escape line breaks so no field can forge additional log lines
    fn escape_line_breaks(text: &str) -> std::borrow::Cow<'_, str> {
        if text.contains(['\n', '\r']) {
            text.replace('\n', "\\n").replace('\r', "\\r").into()
        } else {
            text.into()
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(64 + record.message.len());

        if let Some(ref prefix) = self.prefix {
            out.push_str(&Self::escape_line_breaks(prefix));
            out.push(' ');
        }

        if let Some(timestamp) = self.timestamp_style.format(&record.timestamp) {
            out.push('[');
            out.push_str(&timestamp);
            out.push_str("] ");
        }

        out.push('[');
        out.push_str(record.level.to_str());
        out.push_str("] ");
        out.push_str(&Self::escape_line_breaks(&record.message));

        match (&record.file, record.line) {
            (Some(file), Some(line)) => {
                out.push_str(&format!(" ({}:{})", file, line));
            }
            (Some(file), None) => {
                out.push_str(&format!(" ({})", file));
            }
            _ => {}
        }

        for (key, value) in record.context.fields() {
            out.push(' ');
            out.push_str(&Self::escape_line_breaks(key));
            out.push('=');
            out.push_str(&Self::escape_line_breaks(&value.to_string()));
        }

        out
    }
}

/// Newline-delimited JSON formatter
///
/// Every line is a single JSON object with at least `level` and `message`.
/// Context fields are emitted in insertion order under `context`; repeated
/// keys are all written.
///
/// Example: `{"timestamp":"2025-01-08T10:30:45Z","level":"INFO","message":"Request processed"}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFormatter {
    timestamp_style: TimestampStyle,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self {
            timestamp_style: TimestampStyle::Iso8601,
        }
    }
}

impl JsonFormatter {
    pub fn new(timestamp_style: TimestampStyle) -> Self {
        Self { timestamp_style }
    }

    /// Encode a string as a quoted, escaped JSON string literal
    fn json_string(value: &str) -> String {
        serde_json::Value::from(value).to_string()
    }

    fn push_key(out: &mut String, key: &str) {
        if !out.ends_with('{') {
            out.push(',');
        }
        out.push_str(&Self::json_string(key));
        out.push(':');
    }

    fn timestamp_value(&self, record: &LogRecord) -> Option<String> {
        let rendered = self.timestamp_style.format(&record.timestamp)?;
        if self.timestamp_style.is_numeric() {
            Some(rendered)
        } else {
            Some(Self::json_string(&rendered))
        }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(96 + record.message.len());
        out.push('{');

        if let Some(timestamp) = self.timestamp_value(record) {
            Self::push_key(&mut out, "timestamp");
            out.push_str(&timestamp);
        }

        Self::push_key(&mut out, "level");
        out.push_str(&Self::json_string(record.level.to_str()));

        Self::push_key(&mut out, "message");
        out.push_str(&Self::json_string(&record.message));

        if let Some(ref file) = record.file {
            Self::push_key(&mut out, "file");
            out.push_str(&Self::json_string(file));
        }
        if let Some(line) = record.line {
            Self::push_key(&mut out, "line");
            out.push_str(&line.to_string());
        }

        if !record.context.is_empty() {
            Self::push_key(&mut out, "context");
            out.push('{');
            for (key, value) in record.context.fields() {
                Self::push_key(&mut out, key);
                out.push_str(&value.to_json_value().to_string());
            }
            out.push('}');
        }

        out.push('}');
        out
    }
}
