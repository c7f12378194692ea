//! Insertion-ordered field bag

use super::field_value::FieldValue;

/// Ordered string-keyed mapping of structured fields.
///
/// Keys keep the position of their first insertion; overwriting a key
/// replaces the value in place. Output field order follows this order.
///
/// # Example
///
/// ```
/// use rust_hierarchical_logger::Fields;
///
/// let mut fields = Fields::new()
///     .with_field("service", "api")
///     .with_field("attempt", 1);
/// fields.insert("service", "worker");
///
/// let keys: Vec<&str> = fields.keys().collect();
/// assert_eq!(keys, vec!["service", "attempt"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add a field (builder version)
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<FieldValue>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.position(key).map(move |idx| &mut self.entries[idx].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Remove a field, preserving the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    /// Merge `other` into `self`, overwriting on conflict
    pub fn merge(&mut self, other: &Fields) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        fields.extend(iter);
        fields
    }
}

impl<K, V> Extend<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
