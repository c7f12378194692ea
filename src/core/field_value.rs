//! Dynamic values carried in structured fields
//!
//! `FieldValue` is the value type of every field bag. Owned arrays and objects
//! form trees; `SharedValue` is a reference-counted node with identity, which
//! lets callers build graphs (including cycles) that the encoder must break.

use super::error::Result;
use super::fields::Fields;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Object(Fields),
    Shared(SharedValue),
}

impl FieldValue {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
            FieldValue::Shared(_) => "shared",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            FieldValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert any serializable value through its JSON representation.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Describe an error as an object with `name`, `message` and `stack`.
    ///
    /// `stack` holds the error followed by its `source()` chain, one cause per
    /// line, which is what the `err` serializer looks for.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let full_name = std::any::type_name::<E>();
        let name = full_name.rsplit("::").next().unwrap_or(full_name);

        let mut stack = format!("{}: {}", name, err);
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        FieldValue::Object(
            Fields::new()
                .with_field("name", name)
                .with_field("message", err.to_string())
                .with_field("stack", stack),
        )
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(i) => FieldValue::Int(i),
            Err(_) => FieldValue::Float(i as f64),
        }
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(time: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(time)
    }
}

impl From<Fields> for FieldValue {
    fn from(fields: Fields) -> Self {
        FieldValue::Object(fields)
    }
}

impl From<SharedValue> for FieldValue {
    fn from(shared: SharedValue) -> Self {
        FieldValue::Shared(shared)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FieldValue::Object(map.into_iter().collect()),
        }
    }
}

/// Reference-counted value with identity.
///
/// Clones share the same underlying slot, so a `SharedValue` stored inside
/// itself creates a cycle. Such cycles are never freed; they exist to model
/// caller data graphs, not as a general container.
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<FieldValue>>);

impl SharedValue {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        SharedValue(Arc::new(RwLock::new(value.into())))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, FieldValue> {
        self.0.read()
    }

    pub fn set(&self, value: impl Into<FieldValue>) {
        *self.0.write() = value.into();
    }

    /// Insert a member when the slot holds an object.
    ///
    /// Returns `false` and leaves the slot untouched for any other value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> bool {
        match &mut *self.0.write() {
            FieldValue::Object(fields) => {
                fields.insert(key, value);
                true
            }
            _ => false,
        }
    }

    /// Stable identity of the slot for the lifetime of any clone
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Contents are not printed: the slot may reach itself.
impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue({:#x})", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl std::error::Error for Inner {}

    #[derive(Debug)]
    struct WriteFailed(Inner);

    impl fmt::Display for WriteFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("write failed")
        }
    }

    impl std::error::Error for WriteFailed {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(FieldValue::from("x"), FieldValue::String("x".into()));
        assert_eq!(FieldValue::from(3), FieldValue::Int(3));
        assert_eq!(FieldValue::from(u64::MAX), FieldValue::Float(u64::MAX as f64));
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(
            FieldValue::from(vec![1, 2]),
            FieldValue::Array(vec![FieldValue::Int(1), FieldValue::Int(2)])
        );
    }

    #[test]
    fn test_from_json_objects() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"b": 1, "a": [true, null, 1.5]}"#).unwrap();
        let value = FieldValue::from(json);
        let fields = value.as_object().unwrap();
        assert_eq!(fields.get("b"), Some(&FieldValue::Int(1)));
        assert_eq!(
            fields.get("a"),
            Some(&FieldValue::Array(vec![
                FieldValue::Bool(true),
                FieldValue::Null,
                FieldValue::Float(1.5)
            ]))
        );
    }

    #[test]
    fn test_from_error_includes_cause_chain() {
        let value = FieldValue::from_error(&WriteFailed(Inner));
        let fields = value.as_object().unwrap();
        assert_eq!(fields.get("name").and_then(|v| v.as_str()), Some("WriteFailed"));
        assert_eq!(fields.get("message").and_then(|v| v.as_str()), Some("write failed"));
        let stack = fields.get("stack").and_then(|v| v.as_str()).unwrap();
        assert!(stack.starts_with("WriteFailed: write failed"));
        assert!(stack.contains("caused by: disk full"));
    }

    #[test]
    fn test_shared_identity() {
        let a = SharedValue::new(Fields::new());
        let b = a.clone();
        let c = SharedValue::new(Fields::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id(), b.id());

        assert!(a.insert("self", b.clone()));
        assert!(format!("{:?}", a).starts_with("SharedValue("));

        let scalar = SharedValue::new(1);
        assert!(!scalar.insert("k", 2));
    }
}
