//! Ready-made root logger construction
//!
//! [`create_logger`] fills in what a bare [`Logger::create`] leaves empty: a
//! stdout JSON sink (pretty below INFO) and the built-in serializers.

use crate::core::{Fields, LevelArg, LogLevel, Logger, LoggerConfig, Result, Serializers, SinkRef};
use crate::serializers::default_serializers;
use crate::sinks::JsonSink;
use serde::Deserialize;

/// Options for [`create_logger`]
///
/// The plain parts deserialize from configuration files:
///
/// ```
/// use rust_hierarchical_logger::LoggerOptions;
///
/// let options: LoggerOptions =
///     serde_json::from_str(r#"{"name": "api", "level": "warn"}"#).unwrap();
/// assert_eq!(options.name.as_deref(), Some("api"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub name: Option<String>,

    /// Canonical integer or name; `debug` when unset
    pub level: Option<LevelArg>,

    /// Force pretty or JSON output for the default sink
    pub pretty: Option<bool>,

    #[serde(skip)]
    pub fields: Fields,

    /// Replaces the default stdout sink
    #[serde(skip)]
    pub sink: Option<SinkRef>,

    /// Additional sinks attached after `sink`
    #[serde(skip)]
    pub streams: Vec<SinkRef>,

    /// Replaces the built-in serializer set
    #[serde(skip)]
    pub serializers: Option<Serializers>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn level(mut self, level: impl Into<LevelArg>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<crate::core::FieldValue>,
    {
        self.fields.insert(key, value);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: impl Into<SinkRef>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    #[must_use]
    pub fn stream(mut self, sink: impl Into<SinkRef>) -> Self {
        self.streams.push(sink.into());
        self
    }

    #[must_use]
    pub fn serializers(mut self, serializers: Serializers) -> Self {
        self.serializers = Some(serializers);
        self
    }
}

/// Stdout sink, pretty for TRACE and DEBUG loggers
pub fn default_sink(level: LogLevel) -> JsonSink {
    JsonSink::stdout().pretty(level <= LogLevel::Debug)
}

/// Create a root logger with defaults for everything left unset.
///
/// # Example
///
/// ```no_run
/// use rust_hierarchical_logger::{create_logger, LoggerOptions};
///
/// let logger = create_logger(LoggerOptions::new().name("worker").level("info")).unwrap();
/// logger.info("ready");
/// ```
pub fn create_logger(options: LoggerOptions) -> Result<Logger> {
    let level = match &options.level {
        Some(arg) => arg.resolve()?,
        None => LogLevel::default(),
    };

    let primary = match options.sink {
        Some(sink) => sink,
        None => match options.pretty {
            Some(pretty) => JsonSink::stdout().pretty(pretty).into(),
            None => default_sink(level).into(),
        },
    };

    let mut sinks = vec![primary];
    sinks.extend(options.streams);

    Logger::create(LoggerConfig {
        name: options.name,
        level: Some(LevelArg::Level(level)),
        fields: options.fields,
        sinks,
        serializers: options.serializers.unwrap_or_else(default_serializers),
    })
}
