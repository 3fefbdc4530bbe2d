//! Field schemas for resource types
//!
//! A schema is the single source of truth for which fields a resource
//! type exposes: field copy and lookup resolution are driven exclusively
//! by it. Types that accept arbitrary key/value declarations use
//! [`Schema::Open`] instead of a field spec.

use indexmap::IndexMap;
use serde_json::Value;

/// Expected shape of a declared field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Integer,
    Float,
    List,
    Map,
}

impl FieldKind {
    /// Check a literal value against this kind
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

/// Descriptor for a single declared field
#[derive(Debug, Clone, Default)]
pub struct FieldDef {
    kind: Option<FieldKind>,
    default: Option<Value>,
    required: bool,
}

impl FieldDef {
    /// An optional field with no kind restriction
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// A field that must be present in the declaration
    pub fn required() -> Self {
        Self {
            required: true,
            ..<Self as Default>::default()
        }
    }

    /// Restrict the field to a kind, builder style
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Value used when the declaration omits the field, builder style
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn expected_kind(&self) -> Option<FieldKind> {
        self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Ordered schema of named fields for a resource type
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    fields: IndexMap<String, FieldDef>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, builder style; order of calls is the field order
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Schema variant attached to a resource type definition
#[derive(Debug, Clone)]
pub enum Schema {
    /// Fields are constrained to the spec; copy and resolution follow it
    Fixed(FieldSpec),
    /// No restriction: arbitrary named arguments are accepted and copied
    /// verbatim. Open resources skip lookup resolution entirely, so a
    /// deferred value declared on one reaches its provider unevaluated.
    Open,
}

impl Schema {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn field_spec(&self) -> Option<&FieldSpec> {
        match self {
            Self::Fixed(spec) => Some(spec),
            Self::Open => None,
        }
    }
}
