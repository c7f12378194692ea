//! Core logger types and traits

pub mod encoder;
pub mod error;
pub mod field_value;
pub mod fields;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod serializer;
pub mod sink;
pub mod timestamp;

pub use encoder::{Encoder, CIRCULAR_PLACEHOLDER};
pub use error::{LoggerError, Result};
pub use field_value::{FieldValue, SharedValue};
pub use fields::Fields;
pub use log_level::{is_valid_level_string, LevelArg, LogLevel};
pub use logger::{Logger, LoggerBuilder, LoggerConfig, DEFAULT_LOGGER_NAME};
pub use metrics::SinkMetrics;
pub use record::Record;
pub use serializer::{Serializer, Serializers};
pub use sink::{ErrorCallback, Sink, SinkRef, WriteReporter};
pub use timestamp::TimestampFormat;
