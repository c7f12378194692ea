//! Log level definitions and level argument resolution

use super::error::{LoggerError, Result};
use super::field_value::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbosity level shared by loggers, sinks and records.
///
/// Lower numeric values are more verbose. Each level has a canonical integer
/// (`Info as i64 == 30`) and a canonical lowercase name (`"info"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    Trace = 10,
    #[default]
    Debug = 20,
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Uppercase label used by human-readable output
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Canonical integer value
    #[inline]
    pub fn as_int(&self) -> i64 {
        *self as i64
    }

    /// Resolve a canonical integer (10, 20, ... 60).
    pub fn from_int(value: i64) -> Result<Self> {
        match value {
            10 => Ok(LogLevel::Trace),
            20 => Ok(LogLevel::Debug),
            30 => Ok(LogLevel::Info),
            40 => Ok(LogLevel::Warn),
            50 => Ok(LogLevel::Error),
            60 => Ok(LogLevel::Fatal),
            _ => Err(LoggerError::invalid_level(value)),
        }
    }

    /// Resolve a canonical lowercase name. Other spellings are rejected.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(LoggerError::invalid_level_name(name)),
        }
    }

    pub fn is_valid_name(name: &str) -> bool {
        Self::from_name(name).is_ok()
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
        }
    }
}

/// Whether `name` is one of the six canonical level names
pub fn is_valid_level_string(name: &str) -> bool {
    LogLevel::is_valid_name(name)
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TryFrom<i64> for LogLevel {
    type Error = LoggerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_int(value)
    }
}

/// Untyped level argument as accepted by `set_level` and logger configuration.
///
/// Resolution happens in [`LevelArg::resolve`], so a bad argument is reported
/// at the call that applies it.
///
/// Only the integer and name forms can be deserialized.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelArg {
    Int(i64),
    Name(String),
    Level(LogLevel),
    Unsupported(&'static str),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SerializedLevel {
    Int(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for LevelArg {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match SerializedLevel::deserialize(deserializer)? {
            SerializedLevel::Int(value) => LevelArg::Int(value),
            SerializedLevel::Name(name) => LevelArg::Name(name),
        })
    }
}

impl LevelArg {
    pub fn resolve(&self) -> Result<LogLevel> {
        match self {
            LevelArg::Level(level) => Ok(*level),
            LevelArg::Int(value) => LogLevel::from_int(*value),
            LevelArg::Name(name) if name.is_empty() => {
                Err(LoggerError::invalid_argument_type("empty string"))
            }
            LevelArg::Name(name) => LogLevel::from_name(name),
            LevelArg::Unsupported(found) => Err(LoggerError::invalid_argument_type(found)),
        }
    }
}

impl From<LogLevel> for LevelArg {
    fn from(level: LogLevel) -> Self {
        LevelArg::Level(level)
    }
}

impl From<i64> for LevelArg {
    fn from(value: i64) -> Self {
        LevelArg::Int(value)
    }
}

impl From<i32> for LevelArg {
    fn from(value: i32) -> Self {
        LevelArg::Int(value as i64)
    }
}

impl From<&str> for LevelArg {
    fn from(name: &str) -> Self {
        LevelArg::Name(name.to_string())
    }
}

impl From<String> for LevelArg {
    fn from(name: String) -> Self {
        LevelArg::Name(name)
    }
}

impl From<FieldValue> for LevelArg {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Int(i) => LevelArg::Int(i),
            FieldValue::String(s) => LevelArg::Name(s),
            other => LevelArg::Unsupported(other.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_integers() {
        assert_eq!(LogLevel::Trace.as_int(), 10);
        assert_eq!(LogLevel::Debug.as_int(), 20);
        assert_eq!(LogLevel::Info.as_int(), 30);
        assert_eq!(LogLevel::Warn.as_int(), 40);
        assert_eq!(LogLevel::Error.as_int(), 50);
        assert_eq!(LogLevel::Fatal.as_int(), 60);
    }

    #[test]
    fn test_round_trips() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_int(level.as_int()).unwrap(), level);
            assert_eq!(LogLevel::from_name(level.as_str()).unwrap(), level);
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_invalid_int() {
        let err = LogLevel::from_int(5).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel { value: 5 }));
        assert!(LogLevel::from_int(35).is_err());
    }

    #[test]
    fn test_invalid_name_is_not_coerced() {
        assert!(matches!(
            LogLevel::from_name("foo"),
            Err(LoggerError::InvalidLevelName { .. })
        ));
        assert!(LogLevel::from_name("INFO").is_err());
        assert!(LogLevel::from_name("warning").is_err());
        assert!(!is_valid_level_string(""));
        assert!(is_valid_level_string("fatal"));
    }

    #[test]
    fn test_default_is_debug() {
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }

    #[test]
    fn test_level_arg_resolution() {
        assert_eq!(LevelArg::from(50).resolve().unwrap(), LogLevel::Error);
        assert_eq!(LevelArg::from("warn").resolve().unwrap(), LogLevel::Warn);
        assert_eq!(LevelArg::from(LogLevel::Info).resolve().unwrap(), LogLevel::Info);

        assert!(matches!(
            LevelArg::from(5).resolve(),
            Err(LoggerError::InvalidLevel { value: 5 })
        ));
        assert!(matches!(
            LevelArg::from("foo").resolve(),
            Err(LoggerError::InvalidLevelName { .. })
        ));
        assert!(matches!(
            LevelArg::from("").resolve(),
            Err(LoggerError::InvalidArgumentType { .. })
        ));
        assert!(matches!(
            LevelArg::from(FieldValue::Bool(true)).resolve(),
            Err(LoggerError::InvalidArgumentType { found: "bool" })
        ));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");

        let arg: LevelArg = serde_json::from_str("40").unwrap();
        assert_eq!(arg.resolve().unwrap(), LogLevel::Warn);
        let arg: LevelArg = serde_json::from_str("\"trace\"").unwrap();
        assert_eq!(arg.resolve().unwrap(), LogLevel::Trace);
    }

    #[test]
    fn test_deserialize_rejects_other_json_types() {
        assert!(serde_json::from_str::<LevelArg>("true").is_err());
        assert!(serde_json::from_str::<LevelArg>("2.5").is_err());

        let arg: LevelArg = serde_json::from_str("\"\"").unwrap();
        assert!(matches!(
            arg.resolve(),
            Err(LoggerError::InvalidArgumentType { found: "empty string" })
        ));
    }
}
