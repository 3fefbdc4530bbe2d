//! Declaration file loading
//!
//! A steward manifest is TOML: `[[resource]]` tables carrying a `type`
//! name plus the declared fields. Tables of the form
//! `{ lookup = "env", var = "HOME" }` become deferred values; everything
//! else is a literal.

use crate::lookups::{EnvLookup, FactLookup, FileContentsLookup, TemplateLookup};
use anyhow::{Context as _, Result, anyhow, bail};
use dispatch::{FieldValue, Kwargs, Resource, TypeRegistry};
use serde::Deserialize;
use std::path::Path;

/// A parsed manifest of resource declarations
#[derive(Debug, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub resource: Vec<Declaration>,
}

/// One declared resource: its type name and raw fields
#[derive(Debug, Deserialize)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: toml::Table,
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in steward manifest")
    }

    /// Instantiate every declaration against the registry, in order
    pub fn resources(&self, registry: &TypeRegistry) -> Result<Vec<Resource>> {
        let mut resources = Vec::with_capacity(self.resource.len());
        for declaration in &self.resource {
            let resource = declaration.instantiate(registry).with_context(|| {
                format!("invalid declaration of type '{}'", declaration.type_name)
            })?;
            resources.push(resource);
        }
        Ok(resources)
    }
}

impl Declaration {
    fn instantiate(&self, registry: &TypeRegistry) -> Result<Resource> {
        let mut kwargs = Kwargs::new();
        for (name, value) in &self.fields {
            kwargs = kwargs.set(name, field_value(value)?);
        }
        Ok(registry.instantiate(&self.type_name, kwargs)?)
    }
}

/// Convert a declared TOML value into a field value
fn field_value(value: &toml::Value) -> Result<FieldValue> {
    if let toml::Value::Table(table) = value {
        if let Some(kind) = table.get("lookup").and_then(toml::Value::as_str) {
            return deferred_value(kind, table);
        }
    }
    let literal = serde_json::to_value(value).context("unrepresentable TOML value")?;
    Ok(FieldValue::Literal(literal))
}

fn deferred_value(kind: &str, table: &toml::Table) -> Result<FieldValue> {
    let arg = |key: &str| {
        table
            .get(key)
            .and_then(toml::Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("'{kind}' lookup needs a string '{key}'"))
    };
    match kind {
        "env" => Ok(FieldValue::deferred(EnvLookup::new(arg("var")?))),
        "fact" => Ok(FieldValue::deferred(FactLookup::new(arg("name")?))),
        "file" => Ok(FieldValue::deferred(FileContentsLookup::new(arg("path")?))),
        "template" => Ok(FieldValue::deferred(TemplateLookup::new(arg("text")?))),
        other => bail!("unknown lookup kind '{other}'"),
    }
}

// ============================================================================
// Tests
// ============================================================================
