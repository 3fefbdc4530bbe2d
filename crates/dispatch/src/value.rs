//! Declared field values
//!
//! A declared value is either a literal known at declaration time or a
//! deferred lookup evaluated at provider-construction time. Resolution is
//! a pattern match on this enum, never a runtime type test.

use crate::lookup::Lookup;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// A single declared field value
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A concrete value known at declaration time
    Literal(Value),
    /// A value computed at provider-construction time
    Deferred(Arc<dyn Lookup>),
}

impl FieldValue {
    /// Wrap a lookup as a deferred value
    pub fn deferred(lookup: impl Lookup + 'static) -> Self {
        Self::Deferred(Arc::new(lookup))
    }

    /// The literal value, if this is not deferred
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    /// The literal string value, if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Value::as_str)
    }

    /// Check if this value is still deferred
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Human-readable rendering for diagnostics and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(Value::String(text)) => text.clone(),
            Self::Literal(value) => value.to_string(),
            Self::Deferred(_) => "<deferred>".to_string(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Literal(Value::from(value))
    }
}

/// Raw construction arguments of a declared resource
///
/// Ordered by declaration; immutable once the resource owning them is
/// constructed. All derived values are computed from this map, never
/// cached back onto it.
#[derive(Debug, Clone, Default)]
pub struct Kwargs {
    entries: IndexMap<String, FieldValue>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
