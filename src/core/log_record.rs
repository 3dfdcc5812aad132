//! Log record structure

use super::log_context::LogContext;
use super::log_level::Level;
use chrono::{DateTime, Utc};
use std::fmt::Display;

/// A single log event on its way to the formatter
///
/// Records are ephemeral: they are built by the facade once the level check
/// has passed, rendered once, and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Source file name with any directory prefix removed
    pub file: Option<String>,
    pub line: Option<u32>,
    pub context: LogContext,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            file: None,
            line: None,
            context: LogContext::new(),
        }
    }

    /// Attach the source location; only the basename of `file` is kept
    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        let name = file_basename(file);
        self.file = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        self.line = if line == 0 { None } else { Some(line) };
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Strip any `/` or `\` separated directory prefix
pub fn file_basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Substitute `{}` placeholders in `template` with `args`, in order
///
/// Placeholders without a matching argument are left as-is; surplus
/// arguments are appended, separated by spaces.
///
/// ```
/// use rust_sink_logger::core::log_record::substitute;
///
/// let line = substitute("User {} logged in from {}", &[&"john_doe", &"10.0.0.1"]);
/// assert_eq!(line, "User john_doe logged in from 10.0.0.1");
/// ```
pub fn substitute(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut args = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);

    for arg in args {
        out.push(' ');
        out.push_str(&arg.to_string());
    }
    out
}
