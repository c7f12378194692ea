//! Sink implementations

mod json;
mod memory;
#[cfg(feature = "async-sinks")]
mod tokio_sink;

pub use json::JsonSink;
pub use memory::{MemorySink, SharedBuffer};
#[cfg(feature = "async-sinks")]
pub use tokio_sink::TokioSink;

use crate::core::{Encoder, Record, Result};
use std::time::Duration;

/// How long flushes and worker shutdown wait before giving up (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Text rendering shared by the writer-backed sinks
#[derive(Debug, Clone, Default)]
pub(crate) struct Renderer {
    pub(crate) encoder: Encoder,
    pub(crate) pretty: bool,
    pub(crate) colors: bool,
}

impl Renderer {
    pub(crate) fn render(&self, record: &Record) -> Result<String> {
        if self.pretty {
            self.encoder.render_pretty(record, self.colors)
        } else {
            self.encoder.encode_record(record)
        }
    }
}
