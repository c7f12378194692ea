//! Field serializer registry
//!
//! A serializer is a pure transform bound to a field name. When a record
//! carries that field, the serializer's result replaces it; a `None` result
//! leaves the field as it was.

use super::field_value::FieldValue;
use super::fields::Fields;
use std::fmt;
use std::sync::Arc;

type SerializeFn = dyn Fn(&FieldValue) -> Option<FieldValue> + Send + Sync;

/// Shareable per-field transform
#[derive(Clone)]
pub struct Serializer(Arc<SerializeFn>);

impl Serializer {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Serializer(Arc::new(transform))
    }

    #[inline]
    pub fn apply(&self, value: &FieldValue) -> Option<FieldValue> {
        (self.0)(value)
    }

    pub fn ptr_eq(&self, other: &Serializer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Serializer(..)")
    }
}

/// Mapping of field name to serializer, in registration order
#[derive(Debug, Clone, Default)]
pub struct Serializers {
    entries: Vec<(String, Serializer)>,
}

impl Serializers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a serializer (builder version)
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, serializer: Serializer) -> Self {
        self.insert(field, serializer);
        self
    }

    /// Register or replace the serializer for `field`
    pub fn insert(&mut self, field: impl Into<String>, serializer: Serializer) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = serializer,
            None => self.entries.push((field, serializer)),
        }
    }

    /// Merge `other` into `self`, overwriting on conflict
    pub fn merge(&mut self, other: &Serializers) {
        for (field, serializer) in &other.entries {
            self.insert(field.clone(), serializer.clone());
        }
    }

    pub fn get(&self, field: &str) -> Option<&Serializer> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, serializer)| serializer)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transform every present field that has a registered serializer.
    pub fn apply(&self, fields: &mut Fields) {
        for (field, serializer) in &self.entries {
            if let Some(value) = fields.get_mut(field) {
                if let Some(serialized) = serializer.apply(value) {
                    *value = serialized;
                }
            }
        }
    }
}
