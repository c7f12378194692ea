//! Logging macros for ergonomic field building and message formatting.
//!
//! # Examples
//!
//! ```
//! use rust_hierarchical_logger::prelude::*;
//! use rust_hierarchical_logger::{info, warn};
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder().sink(sink.clone()).build().unwrap();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With call fields
//! warn!(logger, { "attempt" => 2, "max" => 3 }, "Retrying {}", "upload");
//!
//! assert_eq!(sink.len(), 2);
//! ```

/// Build a [`Fields`](crate::Fields) set, keeping the written order.
///
/// ```
/// use rust_hierarchical_logger::{fields, FieldValue};
///
/// let fields = fields! { "user" => "alice", "attempts" => 3 };
/// assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["user", "attempts"]);
/// assert_eq!(fields.get("attempts"), Some(&FieldValue::Int(3)));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert($key, $value);
        )+
        fields
    }};
}

/// Log a formatted message, optionally with call fields.
///
/// ```
/// # use rust_hierarchical_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_hierarchical_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, { "code" => 500 }, "Request failed: {}", "/health");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {
        $logger.log_with_fields($level, format!($($arg)+), $crate::fields! { $($key => $value),* })
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
