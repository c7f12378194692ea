//! Timestamp formatting for encoded records
//!
//! Record `time` values are kept as `DateTime<Utc>`; a sink's encoder picks
//! one of these formats when it turns them into text or numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp encoding options
///
/// # Examples
///
/// ```
/// use rust_hierarchical_logger::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 with offset: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds, encoded as a JSON number
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` as text
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Numeric encoding, for formats that produce a number
    #[must_use]
    pub fn numeric(&self, datetime: &DateTime<Utc>) -> Option<i64> {
        match self {
            TimestampFormat::UnixMillis => Some(datetime.timestamp_millis()),
            _ => None,
        }
    }
}
