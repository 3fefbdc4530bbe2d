//! Provider contract
//!
//! A provider is the executable counterpart of a declared resource. The
//! binding layer constructs one, fills its field bag with value-copies of
//! the resource's fields, resolves deferred values, and hands it to the
//! execution engine. Convergence logic lives with the concrete provider
//! implementations, not here.

use crate::value::FieldValue;
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of the resource a provider was built from
///
/// Read-only, for logging and tracing; never used for identity
/// comparison.
#[derive(Debug, Clone)]
pub struct Origin {
    type_name: String,
    label: String,
}

impl Origin {
    pub fn new(type_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            label: label.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Ordered, dynamically-assigned field storage on a provider
///
/// Field copy and lookup resolution set entries by name without the
/// provider declaring them in advance. Values arrive as value-copies, so
/// later changes to the originating resource never show up here.
#[derive(Debug, Clone, Default)]
pub struct FieldBag {
    entries: IndexMap<String, FieldValue>,
}

impl FieldBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The literal value of a field, if present and resolved
    pub fn literal(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_literal)
    }

    /// The string value of a field, if present and a string literal
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// The string value of a field, or an error naming the field
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.str(name)
            .ok_or_else(|| anyhow!("missing or non-string field '{name}'"))
    }

    /// The boolean value of a field, or a default when absent
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.literal(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Field names in copy order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate fields in copy order
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

/// State every provider carries: its origin and its field bag
#[derive(Debug, Clone)]
pub struct ProviderCore {
    origin: Origin,
    fields: FieldBag,
}

impl ProviderCore {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            fields: FieldBag::new(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn fields(&self) -> &FieldBag {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldBag {
        &mut self.fields
    }
}

/// Context passed to provider apply operations
#[derive(Debug, Clone)]
pub struct ApplyContext {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

impl Default for ApplyContext {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Result of applying a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Already in the desired state
    NoChange,
    /// Something was created
    Created,
    /// Something was changed in place
    Modified,
    /// Something was removed
    Removed,
    /// Apply was skipped
    Skipped { reason: String },
}

impl Outcome {
    /// Check if the outcome represents an actual change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// Tally of apply outcomes across a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl Summary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Total number of providers processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    /// Check if the run was fully successful
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NoChange => self.no_change += 1,
            Outcome::Created => self.created += 1,
            Outcome::Modified => self.modified += 1,
            Outcome::Removed => self.removed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn add_failure(&mut self) {
        self.failed += 1;
    }
}

/// Executable counterpart of a declared resource
///
/// Constructed from an [`Origin`] with an empty field bag; the binding
/// layer populates the bag before the provider is handed to the engine.
pub trait Provider: Send + fmt::Debug {
    fn core(&self) -> &ProviderCore;

    fn core_mut(&mut self) -> &mut ProviderCore;

    /// Converge the real system toward the declared state
    fn apply(&mut self, ctx: &ApplyContext) -> Result<Outcome>;
}

/// Constructor selected by the binding layer for a resource type
pub type ProviderCtor = fn(Origin) -> Box<dyn Provider>;
