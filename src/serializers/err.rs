//! Error object serializer

use crate::core::{FieldValue, Fields, Serializer};

/// Serializer reducing error-like objects to `{name, code, stack}`.
///
/// # Example
///
/// ```
/// use rust_hierarchical_logger::prelude::*;
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let value = FieldValue::from_error(&io);
///
/// let serialized = rust_hierarchical_logger::serializers::err()
///     .apply(&value)
///     .unwrap();
/// let object = serialized.as_object().unwrap();
/// assert_eq!(object.get("name").and_then(FieldValue::as_str), Some("Error"));
/// assert!(object.get("code").unwrap().is_null());
/// ```
pub fn err() -> Serializer {
    Serializer::new(serialize_err)
}

/// Objects (owned or shared) with a non-empty string `stack` become
/// `{name, code, stack}`, absent members as null. Anything else yields
/// `None` and is left untouched.
pub fn serialize_err(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Object(fields) => reduce(fields),
        FieldValue::Shared(shared) => match &*shared.read() {
            FieldValue::Object(fields) => reduce(fields),
            _ => None,
        },
        _ => None,
    }
}

fn reduce(fields: &Fields) -> Option<FieldValue> {
    let stack = fields.get("stack").and_then(FieldValue::as_str)?;
    if stack.is_empty() {
        return None;
    }

    let member = |key: &str| fields.get(key).cloned().unwrap_or(FieldValue::Null);
    Some(FieldValue::Object(
        Fields::new()
            .with_field("name", member("name"))
            .with_field("code", member("code"))
            .with_field("stack", stack),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SharedValue;
    use std::fmt;

    #[derive(Debug)]
    struct ConfigError {
        source: std::io::Error,
    }

    impl fmt::Display for ConfigError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "could not read config")
        }
    }

    impl std::error::Error for ConfigError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_error_object_is_reduced() {
        let error = ConfigError {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing file"),
        };
        let value = FieldValue::from_error(&error);

        let reduced = serialize_err(&value).unwrap();
        let object = reduced.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["name", "code", "stack"]);
        assert_eq!(
            object.get("name").and_then(FieldValue::as_str),
            Some("ConfigError")
        );
        assert!(object.get("code").unwrap().is_null());

        let stack = object.get("stack").and_then(FieldValue::as_str).unwrap();
        assert!(stack.starts_with("ConfigError: could not read config"));
        assert!(stack.contains("caused by: missing file"));
    }

    #[test]
    fn test_code_is_kept() {
        let value = FieldValue::Object(
            Fields::new()
                .with_field("name", "HttpError")
                .with_field("code", "ECONNRESET")
                .with_field("message", "dropped")
                .with_field("stack", "HttpError: dropped"),
        );

        let reduced = serialize_err(&value).unwrap();
        let object = reduced.as_object().unwrap();
        assert_eq!(
            object.get("code").and_then(FieldValue::as_str),
            Some("ECONNRESET")
        );
        assert!(!object.contains_key("message"));
    }

    #[test]
    fn test_shared_error_object() {
        let shared = SharedValue::new(Fields::new().with_field("stack", "Boom: at main"));
        let reduced = serialize_err(&FieldValue::Shared(shared)).unwrap();
        assert!(reduced.as_object().unwrap().get("name").unwrap().is_null());
    }

    #[test]
    fn test_non_errors_pass_through() {
        assert!(serialize_err(&FieldValue::from("plain string")).is_none());
        assert!(serialize_err(&FieldValue::from(42)).is_none());
        assert!(serialize_err(&FieldValue::Object(Fields::new().with_field("a", 1))).is_none());
        assert!(
            serialize_err(&FieldValue::Object(Fields::new().with_field("stack", ""))).is_none()
        );
        assert!(
            serialize_err(&FieldValue::Object(Fields::new().with_field("stack", 3))).is_none()
        );
    }
}
