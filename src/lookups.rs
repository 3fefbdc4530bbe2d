//! Deferred value lookups
//!
//! Lookups stand in for field values that are only knowable at binding
//! time: environment variables, host facts, file contents, rendered
//! templates. Fixed-schema types get these resolved during provider
//! construction; open-schema types pass them through untouched, so a
//! lookup declared on one never evaluates.

use anyhow::{Context as _, Result, anyhow};
use dispatch::{Lookup, Resource};
use serde_json::Value;

/// Value of an environment variable at binding time
#[derive(Debug, Clone)]
pub struct EnvLookup {
    var: String,
}

impl EnvLookup {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Lookup for EnvLookup {
    fn evaluate(&self, _resource: &Resource) -> Result<Value> {
        let value = std::env::var(&self.var)
            .with_context(|| format!("environment variable '{}' is not set", self.var))?;
        Ok(Value::String(value))
    }
}

/// A fact from the owning resource's context
#[derive(Debug, Clone)]
pub struct FactLookup {
    name: String,
}

impl FactLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Lookup for FactLookup {
    fn evaluate(&self, resource: &Resource) -> Result<Value> {
        let facts = resource.facts()?;
        facts
            .get(&self.name)
            .cloned()
            .ok_or_else(|| anyhow!("unknown fact '{}'", self.name))
    }
}

/// Contents of a file, read at binding time
///
/// The path may use `~` and environment variables.
#[derive(Debug, Clone)]
pub struct FileContentsLookup {
    path: String,
}

impl FileContentsLookup {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Lookup for FileContentsLookup {
    fn evaluate(&self, _resource: &Resource) -> Result<Value> {
        let path = crate::paths::expand(&self.path);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Ok(Value::String(contents))
    }
}

/// A template rendered against the owning resource at binding time
#[derive(Debug, Clone)]
pub struct TemplateLookup {
    text: String,
}

impl TemplateLookup {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Lookup for TemplateLookup {
    fn evaluate(&self, resource: &Resource) -> Result<Value> {
        resource.template(&self.text).map(Value::String)
    }
}
