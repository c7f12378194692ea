//! Log record construction

use super::field_value::FieldValue;
use super::fields::Fields;
use super::log_level::LogLevel;
use super::serializer::Serializers;
use chrono::{DateTime, Utc};

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MSG_KEY: &str = "msg";
pub const NAME_KEY: &str = "name";
pub const HOSTNAME_KEY: &str = "hostname";
pub const PID_KEY: &str = "pid";

/// One emitted log record: a flat, ordered, already-serialized field set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Fields,
}

impl Record {
    /// Merge the record sources and apply serializers.
    ///
    /// Precedence, lowest first: contextual fields, then `time`/`level`/`msg`,
    /// then the call's own fields. A key keeps the position where it first
    /// appeared.
    pub fn build(
        context: &Fields,
        level: LogLevel,
        time: DateTime<Utc>,
        msg: &str,
        call_fields: Option<&Fields>,
        serializers: &Serializers,
    ) -> Self {
        let extra = call_fields.map_or(0, Fields::len);
        let mut fields = Fields::with_capacity(context.len() + 3 + extra);
        fields.merge(context);
        fields.insert(TIME_KEY, time);
        fields.insert(LEVEL_KEY, level.as_int());
        fields.insert(MSG_KEY, msg);
        if let Some(call_fields) = call_fields {
            fields.merge(call_fields);
        }

        serializers.apply(&mut fields);
        Self { fields }
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// Level of the record, if the `level` field still holds a canonical integer
    pub fn level(&self) -> Option<LogLevel> {
        self.fields
            .get(LEVEL_KEY)
            .and_then(FieldValue::as_i64)
            .and_then(|n| LogLevel::from_int(n).ok())
    }

    pub fn msg(&self) -> Option<&str> {
        self.fields.get(MSG_KEY).and_then(FieldValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get(NAME_KEY).and_then(FieldValue::as_str)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self.fields.get(TIME_KEY) {
            Some(FieldValue::Timestamp(time)) => Some(*time),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}
