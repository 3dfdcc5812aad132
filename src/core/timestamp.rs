//! Timestamp formatting utilities
//!
//! Provides the timestamp styles used by the formatters. `Standard` renders
//! wall-clock local time for humans, the ISO and numeric styles render UTC.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Timestamp style options
///
/// # Examples
///
/// ```
/// use rust_sink_logger::TimestampStyle;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 12, 15, 12, 30, 45).unwrap();
/// assert_eq!(TimestampStyle::Iso8601.format(&at).as_deref(), Some("2025-12-15T12:30:45Z"));
/// assert_eq!(TimestampStyle::None.format(&at), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// `2025-01-08 10:30:45` in local time
    #[default]
    Standard,

    /// `2025-01-08T10:30:45Z`
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format, rendered in UTC
    ///
    /// ```
    /// use rust_sink_logger::TimestampStyle;
    ///
    /// // Apache log format
    /// let style = TimestampStyle::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),

    /// No timestamp at all
    None,
}

impl TimestampStyle {
    /// Render `datetime`, or `None` when this style omits timestamps
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> Option<String> {
        let rendered = match self {
            TimestampStyle::Standard => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            TimestampStyle::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            TimestampStyle::Rfc3339 => datetime.to_rfc3339(),
            TimestampStyle::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampStyle::Custom(format_str) => {
                // An invalid strftime pattern fails at render time, not construction
                let mut out = String::new();
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    out = datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string();
                }
                out
            }
            TimestampStyle::None => return None,
        };
        Some(rendered)
    }

    /// Check if this is a numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampStyle::UnixMillis)
    }
}
