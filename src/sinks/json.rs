//! JSON sink backed by a dedicated writer thread
//!
//! Records are queued on an unbounded channel and rendered, in submission
//! order, by a worker thread that owns the underlying writer. Encoding and IO
//! failures never reach the logging call; they are counted in the sink's
//! [`SinkMetrics`] and handed to its error callback (or stderr).

use super::{Renderer, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::core::{
    ErrorCallback, LogLevel, LoggerError, Record, Result, Sink, SinkMetrics, SinkRef,
    TimestampFormat, WriteReporter,
};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type BoxedWriter = Box<dyn Write + Send>;

enum Command {
    Write(Record),
    Flush(Sender<()>),
}

/// Sink writing one JSON line (or a pretty rendering) per record
///
/// # Example
///
/// ```
/// use rust_hierarchical_logger::prelude::*;
/// use rust_hierarchical_logger::sinks::SharedBuffer;
///
/// let buffer = SharedBuffer::new();
/// let logger = Logger::builder()
///     .name("app")
///     .sink(JsonSink::new(buffer.clone()))
///     .build()
///     .unwrap();
///
/// logger.info("started");
/// logger.flush().unwrap();
///
/// assert!(buffer.contents().contains(r#""msg":"started""#));
/// ```
pub struct JsonSink {
    name: String,
    level: Option<LogLevel>,
    renderer: Renderer,
    reporter: WriteReporter,
    sender: Mutex<Option<Sender<Command>>>,
    pending: Mutex<Option<(Receiver<Command>, BoxedWriter)>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JsonSink {
    const DEFAULT_NAME: &'static str = "json";

    /// Sink over any byte writer; the worker starts on `init()`
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            level: None,
            renderer: Renderer::default(),
            reporter: WriteReporter::new(Self::DEFAULT_NAME),
            sender: Mutex::new(Some(sender)),
            pending: Mutex::new(Some((receiver, Box::new(writer)))),
            worker: Mutex::new(None),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Append to a file, creating it and its parent directories if needed
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "creating log directory",
                        parent.display().to_string(),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;

        Ok(Self::new(BufWriter::new(file)))
    }

    /// Render records as a summary line plus indented user fields
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.renderer.pretty = pretty;
        self
    }

    /// Colorize level labels in pretty mode
    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.renderer.colors = colors;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.renderer.encoder.set_timestamp_format(format);
        self
    }

    /// Receive every write failure instead of printing it to stderr
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LoggerError) + Send + Sync + 'static,
    {
        let callback: ErrorCallback = Arc::new(callback);
        self.reporter.set_callback(callback);
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.reporter.set_name(self.name.clone());
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.renderer.pretty
    }

    /// Render a record exactly as the worker would, without the line terminator
    pub fn render(&self, record: &Record) -> Result<String> {
        self.renderer.render(record)
    }

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        self.reporter.metrics()
    }

    fn run_worker(
        receiver: Receiver<Command>,
        mut writer: BoxedWriter,
        renderer: Renderer,
        reporter: WriteReporter,
    ) {
        for command in receiver.iter() {
            match command {
                Command::Write(record) => {
                    match renderer.render(&record) {
                        Ok(text) => match writeln!(writer, "{}", text) {
                            Ok(()) => reporter.written(),
                            Err(e) => reporter.failed(&LoggerError::io_operation(
                                "writing record",
                                reporter.sink_name().to_string(),
                                e,
                            )),
                        },
                        Err(e) => reporter
                            .failed(&LoggerError::encoding(reporter.sink_name(), e.to_string())),
                    }

                    // Queue drained
                    if receiver.is_empty() {
                        if let Err(e) = writer.flush() {
                            eprintln!(
                                "[LOGGER ERROR] Sink '{}' failed to flush: {}",
                                reporter.sink_name(),
                                e
                            );
                        }
                    }
                }
                Command::Flush(ack) => {
                    if let Err(e) = writer.flush() {
                        eprintln!(
                            "[LOGGER ERROR] Sink '{}' failed to flush: {}",
                            reporter.sink_name(),
                            e
                        );
                    }
                    let _ = ack.send(());
                }
            }
        }

        if let Err(e) = writer.flush() {
            eprintln!(
                "[LOGGER ERROR] Sink '{}' failed to flush during shutdown: {}",
                reporter.sink_name(),
                e
            );
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender
                .send(command)
                .map_err(|_| LoggerError::sink_closed(&self.name)),
            None => Err(LoggerError::sink_closed(&self.name)),
        }
    }
}

impl Sink for JsonSink {
    fn write(&self, record: &Record) -> Result<()> {
        self.send(Command::Write(record.clone()))
    }

    fn init(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let (receiver, writer) = self
            .pending
            .lock()
            .take()
            .ok_or_else(|| LoggerError::sink_closed(&self.name))?;

        let renderer = self.renderer.clone();
        let reporter = self.reporter.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-sink", self.name))
            .spawn(move || Self::run_worker(receiver, writer, renderer, reporter))
            .map_err(|e| LoggerError::sink_init(&self.name, e.to_string()))?;

        *worker = Some(handle);
        Ok(())
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.level
    }

    /// Block until the worker has written everything queued so far
    fn flush(&self) -> Result<()> {
        if self.worker.lock().is_none() {
            return Ok(());
        }

        let (ack_sender, ack_receiver) = bounded(1);
        self.send(Command::Flush(ack_sender))?;
        ack_receiver
            .recv_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
            .map_err(|_| {
                LoggerError::writer(format!(
                    "sink '{}' did not flush within {:?}",
                    self.name, DEFAULT_SHUTDOWN_TIMEOUT
                ))
            })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn report_error(&self, error: &LoggerError) {
        self.reporter.failed(error);
    }
}

impl Drop for JsonSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        drop(self.sender.lock().take());

        if let Some(handle) = self.worker.lock().take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[LOGGER ERROR] Sink '{}' worker panicked during shutdown: {:?}",
                            self.name, e
                        );
                    }
                    break;
                }

                if start.elapsed() >= DEFAULT_SHUTDOWN_TIMEOUT {
                    eprintln!(
                        "[LOGGER WARNING] Sink '{}' worker did not finish within {:?} timeout. \
                         Some logs may be lost.",
                        self.name, DEFAULT_SHUTDOWN_TIMEOUT
                    );
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

impl std::fmt::Debug for JsonSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSink")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("pretty", &self.renderer.pretty)
            .field("colors", &self.renderer.colors)
            .field("running", &self.worker.lock().is_some())
            .finish()
    }
}

impl From<JsonSink> for SinkRef {
    fn from(sink: JsonSink) -> Self {
        SinkRef::new(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Fields;
    use crate::sinks::SharedBuffer;
    use chrono::TimeZone;
    use chrono::Utc;

    fn fixed_record(extra: Fields) -> Record {
        let time = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123);
        let context = Fields::new()
            .with_field("name", "app")
            .with_field("hostname", "host")
            .with_field("pid", 42);
        Record::build(
            &context,
            LogLevel::Info,
            time,
            "hello",
            Some(&extra),
            &Default::default(),
        )
    }

    #[test]
    fn test_render_json_line() {
        let sink = JsonSink::new(io::sink());
        let line = sink.render(&fixed_record(fields! { "a" => 1 })).unwrap();
        assert_eq!(
            line,
            r#"{"name":"app","hostname":"host","pid":42,"time":"2025-01-08T10:30:45.123Z","level":30,"msg":"hello","a":1}"#
        );
    }

    #[test]
    fn test_render_pretty() {
        let sink = JsonSink::new(io::sink()).pretty(true);
        assert!(sink.is_pretty());

        let plain = sink.render(&fixed_record(Fields::new())).unwrap();
        assert_eq!(plain, "2025-01-08T10:30:45.123Z INFO (30) - app - hello");

        let with_fields = sink.render(&fixed_record(fields! { "a" => 1 })).unwrap();
        let mut lines = with_fields.lines();
        assert_eq!(
            lines.next(),
            Some("2025-01-08T10:30:45.123Z INFO (30) - app - hello -")
        );
        assert_eq!(lines.next(), Some("{"));
    }

    #[test]
    fn test_timestamp_format_applies_to_json_only() {
        let sink = JsonSink::new(io::sink()).with_timestamp_format(TimestampFormat::UnixMillis);
        let line = sink.render(&fixed_record(Fields::new())).unwrap();
        assert!(line.contains(r#""time":1736332245123,"#));

        let pretty = sink.pretty(true);
        let summary = pretty.render(&fixed_record(Fields::new())).unwrap();
        assert_eq!(summary, "2025-01-08T10:30:45.123Z INFO (30) - app - hello");
    }

    #[test]
    fn test_worker_writes_in_order() {
        let buffer = SharedBuffer::new();
        let sink = JsonSink::new(buffer.clone());
        sink.init().unwrap();

        for n in 0..20 {
            sink.write(&fixed_record(fields! { "n" => n })).unwrap();
        }
        sink.flush().unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 20);
        for (n, line) in lines.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["n"], n as i64);
        }
        assert_eq!(sink.metrics().written_count(), 20);
    }

    #[test]
    fn test_records_queued_before_init_are_written() {
        let buffer = SharedBuffer::new();
        let sink = JsonSink::new(buffer.clone());

        sink.write(&fixed_record(Fields::new())).unwrap();
        assert!(buffer.contents().is_empty());

        sink.init().unwrap();
        sink.flush().unwrap();
        assert_eq!(buffer.lines().len(), 1);
    }

    #[test]
    fn test_encoding_failure_is_reported() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&errors);
        let buffer = SharedBuffer::new();
        let sink = JsonSink::new(buffer.clone())
            .named("strict")
            .on_error(move |e| captured.lock().push(e.to_string()));
        sink.init().unwrap();

        sink.write(&fixed_record(fields! { "ratio" => f64::NAN }))
            .unwrap();
        sink.write(&fixed_record(fields! { "ratio" => 0.5 })).unwrap();
        sink.flush().unwrap();

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("strict"));
        assert_eq!(buffer.lines().len(), 1);
        assert_eq!(sink.metrics().failed_count(), 1);
        assert_eq!(sink.metrics().written_count(), 1);
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");

        for msg in ["first", "second"] {
            let sink = JsonSink::file(&path).unwrap();
            sink.init().unwrap();
            let mut record = fixed_record(Fields::new()).into_fields();
            record.insert("msg", msg);
            sink.write(&Record::from_fields(record)).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let msgs: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["msg"].to_string())
            .collect();
        assert_eq!(msgs, vec![r#""first""#, r#""second""#]);
    }

    #[test]
    fn test_write_after_close_fails() {
        let sink = JsonSink::new(io::sink());
        drop(sink.sender.lock().take());
        assert!(matches!(
            sink.write(&fixed_record(Fields::new())),
            Err(LoggerError::SinkClosed { .. })
        ));
    }
}
