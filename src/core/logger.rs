//! Hierarchical logger implementation
//!
//! Loggers form a tree. Each node owns its converged configuration (level,
//! contextual fields, serializers, sinks) and holds `Weak` references to the
//! children it spawned. Every configuration change is pushed depth-first to
//! all live descendants before the mutating call returns; nothing is resolved
//! lazily at emission time.
//!
//! Dropping the last handle to an intermediate node hands its live children
//! to the nearest live ancestor, so later changes still reach them.

use super::{
    error::Result,
    field_value::FieldValue,
    fields::Fields,
    log_level::{LevelArg, LogLevel},
    record::{Record, HOSTNAME_KEY, NAME_KEY, PID_KEY},
    serializer::{Serializer, Serializers},
    sink::SinkRef,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock, Weak};

/// Name given to root loggers created without one
pub const DEFAULT_LOGGER_NAME: &str = "root";

struct HostIdentity {
    hostname: String,
    pid: u32,
}

fn host_identity() -> &'static HostIdentity {
    static IDENTITY: OnceLock<HostIdentity> = OnceLock::new();
    IDENTITY.get_or_init(|| HostIdentity {
        hostname: gethostname::gethostname().to_string_lossy().into_owned(),
        pid: std::process::id(),
    })
}

/// Configuration accepted by [`Logger::create`]
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Logger name; `"root"` when unset
    pub name: Option<String>,
    /// Initial level; `debug` when unset
    pub level: Option<LevelArg>,
    /// Contextual fields merged over the built-in `name`/`hostname`/`pid`
    pub fields: Fields,
    pub sinks: Vec<SinkRef>,
    pub serializers: Serializers,
}

#[derive(Clone)]
struct NodeState {
    level: LogLevel,
    fields: Fields,
    serializers: Serializers,
    sinks: Vec<SinkRef>,
}

struct LoggerNode {
    /// Serializes structural mutations across the whole tree
    tree_lock: Arc<Mutex<()>>,
    state: RwLock<NodeState>,
    parent: Mutex<Weak<LoggerNode>>,
    children: Mutex<Vec<Weak<LoggerNode>>>,
}

impl LoggerNode {
    fn live_children(&self) -> Vec<Arc<LoggerNode>> {
        let mut children = self.children.lock();
        children.retain(|child| child.strong_count() > 0);
        children.iter().filter_map(Weak::upgrade).collect()
    }

    /// Apply `update` to this node, then depth-first to every live descendant.
    /// Callers hold the tree lock. Upgraded children are parked in `visited`
    /// so that none of them is dropped while the lock is held.
    fn propagate(
        &self,
        update: &mut dyn FnMut(&mut NodeState),
        visited: &mut Vec<Arc<LoggerNode>>,
    ) {
        update(&mut *self.state.write());
        for child in self.live_children() {
            child.propagate(update, visited);
            visited.push(child);
        }
    }

    fn has_sink(&self, sink: &SinkRef) -> bool {
        self.state.read().sinks.iter().any(|s| s.ptr_eq(sink))
    }
}

impl Drop for LoggerNode {
    fn drop(&mut self) {
        let orphans = std::mem::take(self.children.get_mut());
        if orphans.iter().all(|child| child.strong_count() == 0) {
            return;
        }

        // Strong handles taken here are released after the tree lock.
        let mut upgraded = Vec::new();
        {
            let _tree = self.tree_lock.lock();
            let Some(parent) = self.parent.get_mut().upgrade() else {
                return;
            };
            let adopted = Arc::downgrade(&parent);
            let mut siblings = parent.children.lock();
            siblings.retain(|sibling| sibling.strong_count() > 0);
            for orphan in orphans {
                if let Some(child) = orphan.upgrade() {
                    *child.parent.lock() = adopted.clone();
                    siblings.push(orphan);
                    upgraded.push(child);
                }
            }
            drop(siblings);
            upgraded.push(parent);
        }
        drop(upgraded);
    }
}

/// Handle to one node of a logger tree.
///
/// Cloning the handle does not create a new node; use [`Logger::spawn_child`]
/// for that.
///
/// # Example
///
/// ```
/// use rust_hierarchical_logger::prelude::*;
///
/// let sink = MemorySink::new();
/// let root = Logger::builder()
///     .level(LogLevel::Info)
///     .sink(sink.clone())
///     .build()
///     .unwrap();
/// let http = root.spawn_child("http");
///
/// http.debug("filtered out");
/// http.info_with_fields("request", fields! { "status" => 200 });
///
/// root.set_level(LogLevel::Debug).unwrap();
/// http.debug("now visible");
///
/// assert_eq!(sink.len(), 2);
/// ```
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
}

impl Logger {
    /// Create a root logger from a configuration.
    ///
    /// Fails if the configured level is not a valid level, or if a sink's
    /// `init()` fails.
    pub fn create(config: LoggerConfig) -> Result<Self> {
        let level = match &config.level {
            Some(arg) => arg.resolve()?,
            None => LogLevel::default(),
        };

        let identity = host_identity();
        let mut fields = Fields::new()
            .with_field(
                NAME_KEY,
                config.name.as_deref().unwrap_or(DEFAULT_LOGGER_NAME),
            )
            .with_field(HOSTNAME_KEY, identity.hostname.as_str())
            .with_field(PID_KEY, identity.pid);
        fields.merge(&config.fields);
        if let Some(name) = &config.name {
            fields.insert(NAME_KEY, name.as_str());
        }

        let logger = Self {
            node: Arc::new(LoggerNode {
                tree_lock: Arc::new(Mutex::new(())),
                state: RwLock::new(NodeState {
                    level,
                    fields,
                    serializers: config.serializers,
                    sinks: Vec::new(),
                }),
                parent: Mutex::new(Weak::new()),
                children: Mutex::new(Vec::new()),
            }),
        };

        for sink in config.sinks {
            logger.add_sink(sink)?;
        }

        Ok(logger)
    }

    /// Create a builder for a root logger
    ///
    /// # Example
    /// ```
    /// use rust_hierarchical_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("api")
    ///     .level("warn")
    ///     .field("region", "eu-west-1")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(logger.level(), LogLevel::Warn);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Run a structural mutation under the tree lock. Nodes upgraded along
    /// the way are released only after the lock is gone.
    fn mutate_tree<R>(&self, mutation: impl FnOnce(&mut Vec<Arc<LoggerNode>>) -> R) -> R {
        let mut visited = Vec::new();
        let result = {
            let _tree = self.node.tree_lock.lock();
            mutation(&mut visited)
        };
        drop(visited);
        result
    }

    /// Change the level of this logger and every existing descendant.
    pub fn set_level(&self, level: impl Into<LevelArg>) -> Result<()> {
        let level = level.into().resolve()?;
        self.mutate_tree(|visited| {
            self.node
                .propagate(&mut |state| state.level = level, visited)
        });
        Ok(())
    }

    /// Merge fields into this logger and every existing descendant,
    /// overwriting on conflict.
    pub fn assign_fields(&self, fields: Fields) {
        self.mutate_tree(|visited| {
            self.node
                .propagate(&mut |state| state.fields.merge(&fields), visited)
        });
    }

    /// Merge serializers into this logger and every existing descendant.
    pub fn assign_serializers(&self, serializers: Serializers) {
        self.mutate_tree(|visited| {
            self.node
                .propagate(&mut |state| state.serializers.merge(&serializers), visited)
        });
    }

    /// Register a single serializer on this subtree
    pub fn assign_serializer(&self, field: impl Into<String>, serializer: Serializer) {
        self.assign_serializers(Serializers::new().with(field, serializer));
    }

    /// Attach a sink to this logger and every existing descendant.
    ///
    /// Attaching a sink this logger already has only re-checks its init.
    /// The sink's `init()` runs the first time the instance is attached
    /// anywhere; if it fails the sink is not attached.
    pub fn add_sink(&self, sink: impl Into<SinkRef>) -> Result<()> {
        let sink = sink.into();
        self.mutate_tree(|visited| {
            sink.init_once()?;
            if self.node.has_sink(&sink) {
                return Ok(());
            }

            sink.ensure_default_level();
            self.node.propagate(
                &mut |state| {
                    if !state.sinks.iter().any(|s| s.ptr_eq(&sink)) {
                        state.sinks.push(sink.clone());
                    }
                },
                visited,
            );
            Ok(())
        })
    }

    /// Create a child logger carrying a snapshot of this logger's
    /// configuration, with `name` overridden. Later changes made on this
    /// logger propagate to the child.
    pub fn spawn_child(&self, name: impl Into<String>) -> Logger {
        let _tree = self.node.tree_lock.lock();

        let name: String = name.into();
        let mut state = self.node.state.read().clone();
        state.fields.insert(NAME_KEY, name);

        let child = Arc::new(LoggerNode {
            tree_lock: Arc::clone(&self.node.tree_lock),
            state: RwLock::new(state),
            parent: Mutex::new(Arc::downgrade(&self.node)),
            children: Mutex::new(Vec::new()),
        });
        let mut children = self.node.children.lock();
        children.retain(|existing| existing.strong_count() > 0);
        children.push(Arc::downgrade(&child));
        drop(children);

        Logger { node: child }
    }

    pub fn level(&self) -> LogLevel {
        self.node.state.read().level
    }

    pub fn fields(&self) -> Fields {
        self.node.state.read().fields.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.node
            .state
            .read()
            .fields
            .get(NAME_KEY)
            .and_then(FieldValue::as_str)
            .map(str::to_string)
    }

    pub fn serializers(&self) -> Serializers {
        self.node.state.read().serializers.clone()
    }

    pub fn sinks(&self) -> Vec<SinkRef> {
        self.node.state.read().sinks.clone()
    }

    /// Number of live direct children, including any adopted from dropped
    /// intermediate loggers
    pub fn children_count(&self) -> usize {
        self.node.live_children().len()
    }

    /// Whether a call at `level` would build a record
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message.into(), None);
    }

    pub fn log_with_fields(&self, level: LogLevel, message: impl Into<String>, fields: Fields) {
        self.emit(level, message.into(), Some(&fields));
    }

    fn emit(&self, level: LogLevel, message: String, call_fields: Option<&Fields>) {
        // Snapshot under the read lock; serializers and sinks run without it.
        let (context, serializers, sinks) = {
            let state = self.node.state.read();
            if level < state.level {
                return;
            }
            (
                state.fields.clone(),
                state.serializers.clone(),
                state.sinks.clone(),
            )
        };

        let record = Record::build(
            &context,
            level,
            Utc::now(),
            &message,
            call_fields,
            &serializers,
        );

        for sink in &sinks {
            if sink.accepts(level) {
                sink.deliver(&record);
            }
        }
    }

    /// Flush every sink attached to this logger
    pub fn flush(&self) -> Result<()> {
        for sink in self.sinks() {
            sink.flush()?;
        }
        Ok(())
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    #[inline]
    pub fn trace_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Trace, message, fields);
    }

    #[inline]
    pub fn debug_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Debug, message, fields);
    }

    #[inline]
    pub fn info_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Info, message, fields);
    }

    #[inline]
    pub fn warn_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Warn, message, fields);
    }

    #[inline]
    pub fn error_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Error, message, fields);
    }

    #[inline]
    pub fn fatal_with_fields(&self, message: impl Into<String>, fields: Fields) {
        self.log_with_fields(LogLevel::Fatal, message, fields);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.node.state.read();
        f.debug_struct("Logger")
            .field("level", &state.level)
            .field("fields", &state.fields)
            .field("serializers", &state.serializers)
            .field("sinks", &state.sinks)
            .finish()
    }
}

/// Builder for root loggers with a fluent API
///
/// # Example
/// ```
/// use rust_hierarchical_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Trace)
///     .sink(MemorySink::new())
///     .serializer("err", rust_hierarchical_logger::serializers::err())
///     .build()
///     .unwrap();
/// assert_eq!(logger.sinks().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Set the level from a `LogLevel`, canonical integer or name
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<LevelArg>) -> Self {
        self.config.level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.config.fields.insert(key, value);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Fields) -> Self {
        self.config.fields.merge(&fields);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: impl Into<SinkRef>) -> Self {
        self.config.sinks.push(sink.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sinks<I>(mut self, sinks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SinkRef>,
    {
        self.config.sinks.extend(sinks.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn serializer(mut self, field: impl Into<String>, serializer: Serializer) -> Self {
        self.config.serializers.insert(field, serializer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn serializers(mut self, serializers: Serializers) -> Self {
        self.config.serializers.merge(&serializers);
        self
    }

    pub fn build(self) -> Result<Logger> {
        Logger::create(self.config)
    }
}
