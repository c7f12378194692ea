//! Sink writing through a tokio task
//!
//! Requires the `async-sinks` feature and a running tokio runtime at the time
//! the sink is first attached. From async code use [`TokioSink::flush_async`];
//! the blocking [`Sink::flush`] only works on threads outside the runtime.

use super::Renderer;
use crate::core::{
    ErrorCallback, LogLevel, LoggerError, Record, Result, Sink, SinkMetrics, SinkRef,
    TimestampFormat, WriteReporter,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

type BoxedAsyncWriter = Box<dyn AsyncWrite + Send + Unpin>;

enum Command {
    Write(Record),
    Flush(oneshot::Sender<()>),
}

struct Channel {
    sender: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    pending: Mutex<Option<(mpsc::UnboundedReceiver<Command>, BoxedAsyncWriter)>>,
}

/// Sink rendering records like [`JsonSink`](super::JsonSink) but writing them
/// to an [`AsyncWrite`] from a spawned task.
///
/// Clones share the same queue and task, so a handle kept by the caller can
/// await [`TokioSink::flush_async`] after another clone has been attached.
///
/// # Example
///
/// ```no_run
/// use rust_hierarchical_logger::prelude::*;
/// use rust_hierarchical_logger::sinks::TokioSink;
///
/// # async fn example() -> Result<()> {
/// let sink = TokioSink::new(tokio::io::stdout());
/// let logger = Logger::builder().sink(sink.clone()).build()?;
///
/// logger.info("from a task");
/// sink.flush_async().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TokioSink {
    name: String,
    level: Option<LogLevel>,
    renderer: Renderer,
    reporter: WriteReporter,
    channel: Arc<Channel>,
}

impl TokioSink {
    const DEFAULT_NAME: &'static str = "tokio";

    pub fn new<W: AsyncWrite + Send + Unpin + 'static>(writer: W) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            level: None,
            renderer: Renderer::default(),
            reporter: WriteReporter::new(Self::DEFAULT_NAME),
            channel: Arc::new(Channel {
                sender: Mutex::new(Some(sender)),
                pending: Mutex::new(Some((receiver, Box::new(writer)))),
            }),
        }
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.renderer.pretty = pretty;
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

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        self.reporter.metrics()
    }

    /// Wait until the task has written and flushed everything queued so far
    pub async fn flush_async(&self) -> Result<()> {
        let (ack_sender, ack_receiver) = oneshot::channel();
        self.send(Command::Flush(ack_sender))?;
        ack_receiver
            .await
            .map_err(|_| LoggerError::sink_closed(&self.name))
    }

    /// Stop accepting records; the task drains the queue and closes the writer
    pub fn close(&self) {
        drop(self.channel.sender.lock().take());
    }

    fn send(&self, command: Command) -> Result<()> {
        match self.channel.sender.lock().as_ref() {
            Some(sender) => sender
                .send(command)
                .map_err(|_| LoggerError::sink_closed(&self.name)),
            None => Err(LoggerError::sink_closed(&self.name)),
        }
    }

    async fn run(
        mut receiver: mpsc::UnboundedReceiver<Command>,
        mut writer: BoxedAsyncWriter,
        renderer: Renderer,
        reporter: WriteReporter,
    ) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Write(record) => match renderer.render(&record) {
                    Ok(mut text) => {
                        text.push('\n');
                        match writer.write_all(text.as_bytes()).await {
                            Ok(()) => reporter.written(),
                            Err(e) => reporter.failed(&LoggerError::io_operation(
                                "writing record",
                                reporter.sink_name().to_string(),
                                e,
                            )),
                        }
                    }
                    Err(e) => {
                        reporter.failed(&LoggerError::encoding(reporter.sink_name(), e.to_string()))
                    }
                },
                Command::Flush(ack) => {
                    if let Err(e) = writer.flush().await {
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

        if let Err(e) = writer.shutdown().await {
            eprintln!(
                "[LOGGER ERROR] Sink '{}' failed to shut down writer: {}",
                reporter.sink_name(),
                e
            );
        }
    }
}

impl Sink for TokioSink {
    fn write(&self, record: &Record) -> Result<()> {
        self.send(Command::Write(record.clone()))
    }

    /// Spawn the writer task on the current runtime
    fn init(&self) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| LoggerError::sink_init(&self.name, e.to_string()))?;

        let Some((receiver, writer)) = self.channel.pending.lock().take() else {
            // Another clone already started the task
            return Ok(());
        };

        runtime.spawn(Self::run(
            receiver,
            writer,
            self.renderer.clone(),
            self.reporter.clone(),
        ));
        Ok(())
    }

    /// Block until the task has written and flushed everything queued so far.
    ///
    /// Waiting from inside a runtime would stall it, so there this fails with
    /// a `WriterError` and callers must await [`TokioSink::flush_async`].
    fn flush(&self) -> Result<()> {
        if self.channel.pending.lock().is_some() {
            // Task not started, nothing has been queued
            return Ok(());
        }
        if Handle::try_current().is_ok() {
            return Err(LoggerError::writer(format!(
                "sink '{}' cannot flush synchronously inside a tokio runtime; use flush_async",
                self.name
            )));
        }

        let (ack_sender, ack_receiver) = oneshot::channel();
        self.send(Command::Flush(ack_sender))?;
        ack_receiver
            .blocking_recv()
            .map_err(|_| LoggerError::sink_closed(&self.name))
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.level
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn report_error(&self, error: &LoggerError) {
        self.reporter.failed(error);
    }
}

impl std::fmt::Debug for TokioSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSink")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("pretty", &self.renderer.pretty)
            .finish()
    }
}

impl From<TokioSink> for SinkRef {
    fn from(sink: TokioSink) -> Self {
        SinkRef::new(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, Logger};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_tokio_sink_writes_lines() {
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);
        let sink = TokioSink::new(writer);
        let logger = Logger::builder()
            .name("async")
            .level(LogLevel::Info)
            .sink(sink.clone())
            .build()
            .unwrap();

        logger.debug("hidden");
        logger.info_with_fields("one", fields! { "n" => 1 });
        logger.warn("two");
        sink.flush_async().await.unwrap();
        assert_eq!(sink.metrics().written_count(), 2);

        sink.close();
        drop(logger);

        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();

        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["msg"], "one");
        assert_eq!(lines[0]["n"], 1);
        assert_eq!(lines[0]["name"], "async");
        assert_eq!(lines[1]["level"], 40);
    }

    #[tokio::test]
    async fn test_blocking_flush_inside_runtime_fails() {
        let (writer, _reader) = tokio::io::duplex(1024);
        let sink = TokioSink::new(writer);
        let logger = Logger::builder().sink(sink.clone()).build().unwrap();

        logger.info("queued");
        assert!(matches!(logger.flush(), Err(LoggerError::WriterError(_))));
        sink.flush_async().await.unwrap();
        assert_eq!(sink.metrics().written_count(), 1);
    }

    #[test]
    fn test_blocking_flush_from_plain_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);
        let sink = TokioSink::new(writer);
        let logger = {
            let _guard = runtime.enter();
            Logger::builder().sink(sink.clone()).build().unwrap()
        };

        logger.info("first");
        logger.warn("second");
        logger.flush().unwrap();
        assert_eq!(sink.metrics().written_count(), 2);

        sink.close();
        let output = runtime.block_on(async move {
            let mut output = String::new();
            reader.read_to_string(&mut output).await.unwrap();
            output
        });
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_init_outside_runtime_fails() {
        let (writer, _reader) = tokio::io::duplex(1024);
        let err = Logger::builder()
            .sink(TokioSink::new(writer))
            .build()
            .unwrap_err();
        assert!(matches!(err, LoggerError::SinkInit { .. }));
    }
}
