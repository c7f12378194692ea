//! In-memory sink and writer for capturing output

use crate::core::{LogLevel, Record, Result, Sink, SinkRef};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sink that keeps every record it receives, in order.
///
/// Clones share the same storage, so a test can keep one handle and attach
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
    inits: Arc<AtomicUsize>,
    level: Option<LogLevel>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a minimum level for the sink
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of times `init()` ran
    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &Record) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn init(&self) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.level
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl From<MemorySink> for SinkRef {
    fn from(sink: MemorySink) -> Self {
        SinkRef::new(sink)
    }
}

/// Cloneable `Write` target backed by a shared byte buffer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Fields;

    #[test]
    fn test_memory_sink_captures_records() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.write(&Record::from_fields(Fields::new().with_field("msg", "a")))
            .unwrap();
        sink.write(&Record::from_fields(Fields::new().with_field("msg", "b")))
            .unwrap();

        let messages: Vec<_> = handle
            .records()
            .iter()
            .filter_map(|r| r.msg().map(str::to_string))
            .collect();
        assert_eq!(messages, vec!["a", "b"]);

        handle.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_memory_sink_level() {
        assert_eq!(MemorySink::new().min_level(), None);
        assert_eq!(
            MemorySink::new().with_level(LogLevel::Warn).min_level(),
            Some(LogLevel::Warn)
        );
    }

    #[test]
    fn test_shared_buffer() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writeln!(writer, "first").unwrap();
        writeln!(writer, "second").unwrap();

        assert_eq!(buffer.lines(), vec!["first", "second"]);
    }
}
