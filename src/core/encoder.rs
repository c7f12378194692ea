//! Cycle-safe record encoding
//!
//! Records are encoded straight through `serde`, walking `FieldValue`s with a
//! per-call set of shared-value identities. A shared value met a second time in
//! the same pass is written as [`CIRCULAR_PLACEHOLDER`] instead of being
//! descended into again, so cyclic caller data never recurses forever.
//!
//! The encoder also provides the "pretty" rendering: a one-line summary of the
//! reserved fields, followed by the remaining fields as indented JSON.

use super::error::Result;
use super::field_value::FieldValue;
use super::fields::Fields;
use super::log_level::LogLevel;
use super::record::{
    Record, HOSTNAME_KEY, LEVEL_KEY, MSG_KEY, NAME_KEY, PID_KEY, TIME_KEY,
};
use super::timestamp::TimestampFormat;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::collections::HashSet;

pub const CIRCULAR_PLACEHOLDER: &str = "[Circular]";

/// Fields shown in the pretty summary line rather than the detail block
pub const PRETTY_RESERVED: [&str; 6] = [TIME_KEY, LEVEL_KEY, HOSTNAME_KEY, NAME_KEY, PID_KEY, MSG_KEY];

type Seen = RefCell<HashSet<usize>>;

struct EncodeValue<'a> {
    value: &'a FieldValue,
    seen: &'a Seen,
    timestamps: &'a TimestampFormat,
}

struct EncodeFields<'a> {
    fields: &'a Fields,
    seen: &'a Seen,
    timestamps: &'a TimestampFormat,
}

impl Serialize for EncodeValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.value {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            FieldValue::Float(f) => Err(S::Error::custom(format!(
                "non-finite float {} has no JSON representation",
                f
            ))),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Timestamp(time) => match self.timestamps.numeric(time) {
                Some(n) => serializer.serialize_i64(n),
                None => serializer.serialize_str(&self.timestamps.format(time)),
            },
            FieldValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&EncodeValue {
                        value: item,
                        seen: self.seen,
                        timestamps: self.timestamps,
                    })?;
                }
                seq.end()
            }
            FieldValue::Object(fields) => EncodeFields {
                fields,
                seen: self.seen,
                timestamps: self.timestamps,
            }
            .serialize(serializer),
            FieldValue::Shared(shared) => {
                // `insert` returns false when the identity was already visited
                if !self.seen.borrow_mut().insert(shared.id()) {
                    return serializer.serialize_str(CIRCULAR_PLACEHOLDER);
                }
                let inner = shared.read();
                let encoded = EncodeValue {
                    value: &inner,
                    seen: self.seen,
                    timestamps: self.timestamps,
                }
                .serialize(serializer);
                encoded
            }
        }
    }
}

impl Serialize for EncodeFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in self.fields.iter() {
            map.serialize_entry(
                key,
                &EncodeValue {
                    value,
                    seen: self.seen,
                    timestamps: self.timestamps,
                },
            )?;
        }
        map.end()
    }
}

/// Turns field sets and records into text
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    timestamp_format: TimestampFormat,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn set_timestamp_format(&mut self, format: TimestampFormat) {
        self.timestamp_format = format;
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp_format
    }

    /// Single-line JSON object; each call starts with an empty seen-set
    pub fn to_json(&self, fields: &Fields) -> Result<String> {
        let seen = Seen::default();
        let json = serde_json::to_string(&self.encode_fields(fields, &seen))?;
        Ok(json)
    }

    /// Indented JSON object
    pub fn to_json_pretty(&self, fields: &Fields) -> Result<String> {
        let seen = Seen::default();
        let json = serde_json::to_string_pretty(&self.encode_fields(fields, &seen))?;
        Ok(json)
    }

    /// Encode a single value, for callers rendering fields one at a time
    pub fn value_to_json(&self, value: &FieldValue) -> Result<String> {
        let seen = Seen::default();
        let json = serde_json::to_string(&EncodeValue {
            value,
            seen: &seen,
            timestamps: &self.timestamp_format,
        })?;
        Ok(json)
    }

    pub fn encode_record(&self, record: &Record) -> Result<String> {
        self.to_json(record.fields())
    }

    /// Human-readable rendering.
    ///
    /// `<time> <LEVEL> (<n>) - <name> - <msg>`, and when any non-reserved
    /// field is present the line ends with ` -` and the fields follow as
    /// indented JSON on the next lines.
    pub fn render_pretty(&self, record: &Record, colors: bool) -> Result<String> {
        let fields = record.fields();

        // The summary time is always ISO-8601; the format option covers JSON.
        let time = match fields.get(TIME_KEY) {
            Some(FieldValue::Timestamp(time)) => TimestampFormat::Iso8601.format(time),
            Some(other) => self.plain(other)?,
            None => "-".to_string(),
        };

        let level_number = fields.get(LEVEL_KEY).and_then(FieldValue::as_i64);
        let label = level_number
            .and_then(|n| LogLevel::from_int(n).ok())
            .map(|level| Self::level_label(level, colors))
            .unwrap_or_else(|| "LEVEL".to_string());
        let number = level_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());

        let name = fields
            .get(NAME_KEY)
            .map(|v| self.plain(v))
            .transpose()?
            .unwrap_or_else(|| "-".to_string());
        let msg = fields
            .get(MSG_KEY)
            .map(|v| self.plain(v))
            .transpose()?
            .unwrap_or_default();

        let summary = format!("{} {} ({}) - {} - {}", time, label, number, name, msg);

        let user: Fields = fields
            .iter()
            .filter(|(key, _)| !PRETTY_RESERVED.contains(key))
            .map(|(key, value)| (key, value.clone()))
            .collect();

        if user.is_empty() {
            return Ok(summary);
        }

        Ok(format!("{} -\n{}", summary, self.to_json_pretty(&user)?))
    }

    fn encode_fields<'a>(&'a self, fields: &'a Fields, seen: &'a Seen) -> EncodeFields<'a> {
        EncodeFields {
            fields,
            seen,
            timestamps: &self.timestamp_format,
        }
    }

    /// Strings and timestamps unquoted, anything else as compact JSON
    fn plain(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::String(s) => Ok(s.clone()),
            FieldValue::Timestamp(time) => Ok(self.timestamp_format.format(time)),
            other => self.value_to_json(other),
        }
    }

    #[cfg(feature = "console")]
    fn level_label(level: LogLevel, colors: bool) -> String {
        use colored::Colorize;
        if colors {
            level.label().color(level.color_code()).to_string()
        } else {
            level.label().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_label(level: LogLevel, _colors: bool) -> String {
        level.label().to_string()
    }
}
