//! Sink trait and the shared sink handle attached to loggers

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::metrics::SinkMetrics;
use super::record::Record;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback receiving every failed write of a sink
pub type ErrorCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Output destination for log records.
///
/// `write` is called once per record that passed both the logger's and the
/// sink's level. Sinks that defer work report late failures through
/// [`Sink::report_error`].
pub trait Sink: Send + Sync {
    fn write(&self, record: &Record) -> Result<()>;

    /// One-time setup, run the first time the sink is attached anywhere
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Level declared by the sink itself; `None` means "accept everything"
    fn min_level(&self) -> Option<LogLevel> {
        None
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    fn report_error(&self, error: &LoggerError) {
        eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", self.name(), error);
    }
}

/// Failure reporting shared by sinks that write off the caller's thread
#[derive(Clone)]
pub struct WriteReporter {
    sink_name: String,
    metrics: Arc<SinkMetrics>,
    on_error: Option<ErrorCallback>,
}

impl WriteReporter {
    pub fn new(sink_name: impl Into<String>) -> Self {
        Self {
            sink_name: sink_name.into(),
            metrics: Arc::new(SinkMetrics::new()),
            on_error: None,
        }
    }

    pub fn set_name(&mut self, sink_name: impl Into<String>) {
        self.sink_name = sink_name.into();
    }

    pub fn set_callback(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn written(&self) {
        self.metrics.record_written();
    }

    pub fn failed(&self, error: &LoggerError) {
        self.metrics.record_failed();
        match &self.on_error {
            Some(callback) => callback(error),
            None => eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", self.sink_name, error),
        }
    }
}

impl fmt::Debug for WriteReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteReporter")
            .field("sink_name", &self.sink_name)
            .field("metrics", &self.metrics)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct SinkSlot {
    sink: Box<dyn Sink>,
    level: RwLock<Option<LogLevel>>,
    initialized: Mutex<bool>,
}

/// Shared handle to a sink.
///
/// Clones refer to the same sink instance: identity, minimum level and the
/// one-time init flag all live on the handle, so attaching the same sink to
/// several loggers never repeats `init()`.
#[derive(Clone)]
pub struct SinkRef {
    slot: Arc<SinkSlot>,
}

impl SinkRef {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        let level = sink.min_level();
        Self {
            slot: Arc::new(SinkSlot {
                sink: Box::new(sink),
                level: RwLock::new(level),
                initialized: Mutex::new(false),
            }),
        }
    }

    /// Override the sink's minimum level
    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.set_level(level);
        self
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.slot.level.write() = Some(level);
    }

    /// Minimum level, `None` until declared or attached
    pub fn level(&self) -> Option<LogLevel> {
        *self.slot.level.read()
    }

    pub fn name(&self) -> &str {
        self.slot.sink.name()
    }

    pub fn sink(&self) -> &dyn Sink {
        self.slot.sink.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        *self.slot.initialized.lock()
    }

    pub fn ptr_eq(&self, other: &SinkRef) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub fn flush(&self) -> Result<()> {
        self.slot.sink.flush()
    }

    /// Whether a record at `level` passes this sink's own threshold
    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.level().unwrap_or(LogLevel::Trace)
    }

    /// Run `init()` unless this sink instance already ran it.
    ///
    /// A failed init leaves the flag unset so a later attach retries.
    pub(crate) fn init_once(&self) -> Result<()> {
        let mut initialized = self.slot.initialized.lock();
        if !*initialized {
            self.slot.sink.init()?;
            *initialized = true;
        }
        Ok(())
    }

    pub(crate) fn ensure_default_level(&self) {
        let mut level = self.slot.level.write();
        if level.is_none() {
            *level = Some(LogLevel::Trace);
        }
    }

    /// Write with per-sink panic isolation; failures go to the sink's reporter.
    pub(crate) fn deliver(&self, record: &Record) {
        let sink = &self.slot.sink;
        let result = panic::catch_unwind(AssertUnwindSafe(|| sink.write(record)));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => sink.report_error(&e),
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked: {}. \
                     Other sinks continue to function.",
                    sink.name(),
                    panic_msg
                );
            }
        }
    }
}

impl fmt::Debug for SinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRef")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
