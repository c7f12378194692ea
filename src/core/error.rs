//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Integer that is not one of the canonical level values
    #[error("no level found for integer {value}")]
    InvalidLevel { value: i64 },

    /// String that is not one of the canonical level names
    #[error("invalid level name {name:?}")]
    InvalidLevelName { name: String },

    /// Level argument that is neither an integer nor a non-empty string
    #[error("invalid level argument type: expected integer or non-empty string, found {found}")]
    InvalidArgumentType { found: &'static str },

    /// Record could not be encoded even after cycle-breaking
    #[error("Encoding failed in sink '{sink}': {message}")]
    EncodingFailure { sink: String, message: String },

    /// Sink one-time initialization failed
    #[error("Failed to initialize sink '{sink}': {message}")]
    SinkInit { sink: String, message: String },

    /// Sink worker is no longer accepting records
    #[error("Sink '{sink}' is closed")]
    SinkClosed { sink: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an invalid integer level error
    pub fn invalid_level(value: i64) -> Self {
        LoggerError::InvalidLevel { value }
    }

    /// Create an invalid level name error
    pub fn invalid_level_name(name: impl Into<String>) -> Self {
        LoggerError::InvalidLevelName { name: name.into() }
    }

    /// Create an invalid argument type error
    pub fn invalid_argument_type(found: &'static str) -> Self {
        LoggerError::InvalidArgumentType { found }
    }

    /// Create an encoding failure for the named sink
    pub fn encoding(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::EncodingFailure {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a sink initialization error
    pub fn sink_init(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkInit {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a closed sink error
    pub fn sink_closed(sink: impl Into<String>) -> Self {
        LoggerError::SinkClosed { sink: sink.into() }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Whether this error is a configuration error surfaced by a mutating call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidLevel { .. }
                | LoggerError::InvalidLevelName { .. }
                | LoggerError::InvalidArgumentType { .. }
        )
    }
}
