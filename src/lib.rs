//! # Rust Hierarchical Logger
//!
//! Structured JSON logging organized as a tree of loggers.
//!
//! ## Features
//!
//! - **Hierarchical configuration**: level, fields, sinks and serializers set
//!   on a logger reach every descendant it has spawned
//! - **Structured records**: ordered fields, per-field serializers, one JSON
//!   line per record
//! - **Cycle-safe encoding**: shared values that refer back to themselves are
//!   written as `"[Circular]"`
//! - **Per-sink thresholds**: each sink keeps its own minimum level
//!
//! ## Example
//!
//! ```
//! use rust_hierarchical_logger::prelude::*;
//!
//! let sink = MemorySink::new();
//! let root = Logger::builder()
//!     .name("app")
//!     .level("info")
//!     .sink(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! let db = root.spawn_child("db");
//! db.warn_with_fields("slow query", fields! { "ms" => 1200 });
//!
//! assert_eq!(sink.records()[0].name(), Some("db"));
//! ```

#[macro_use]
pub mod macros;

pub mod core;
pub mod factory;
pub mod serializers;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        Encoder, FieldValue, Fields, LevelArg, LogLevel, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, Record, Result, Serializer, Serializers, SharedValue, Sink, SinkMetrics,
        SinkRef, TimestampFormat,
    };
    pub use crate::factory::{create_logger, LoggerOptions};
    pub use crate::fields;
    pub use crate::sinks::{JsonSink, MemorySink};
}

pub use crate::core::{
    Encoder, ErrorCallback, FieldValue, Fields, LevelArg, LogLevel, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, Record, Result, Serializer, Serializers, SharedValue, Sink,
    SinkMetrics, SinkRef, TimestampFormat, CIRCULAR_PLACEHOLDER, DEFAULT_LOGGER_NAME,
};
pub use factory::{create_logger, default_sink, LoggerOptions};
pub use sinks::{JsonSink, MemorySink, DEFAULT_SHUTDOWN_TIMEOUT};
