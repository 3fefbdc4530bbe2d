//! Execution context and collaborator seams
//!
//! A context is the scope a resource consults for facts and templates.
//! The engine builds one, shares it across resources via `Arc`, and
//! attaches it exactly once per resource before validation or binding.
//! This layer treats the context as read-only.

use crate::resource::Resource;
use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Read-only snapshot of observed host state
#[derive(Debug, Clone, Default)]
pub struct Facts {
    entries: IndexMap<String, Value>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of fact snapshots for a context
///
/// `snapshot` is called every time a resource asks for facts; sources
/// that gather expensive state decide for themselves what to cache.
pub trait FactSource: Send + Sync + fmt::Debug {
    fn snapshot(&self) -> Facts;
}

/// Fact source backed by a fixed snapshot
///
/// Useful in tests and for engines that gather facts once up front.
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    facts: Facts,
}

impl StaticFacts {
    pub fn new(facts: Facts) -> Self {
        Self { facts }
    }
}

impl FactSource for StaticFacts {
    fn snapshot(&self) -> Facts {
        self.facts.clone()
    }
}

/// Text rendering seam consumed by resources
///
/// `scope` is the resource whose fields are visible to template
/// expressions.
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    fn render_str(&self, text: &str, scope: &Resource) -> Result<String>;

    fn render_file(&self, path: &Path, scope: &Resource) -> Result<String> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read template file: {}", path.display()))?;
        self.render_str(&text, scope)
    }
}

/// Template engine that performs no interpolation
#[derive(Debug, Clone, Default)]
pub struct Verbatim;

impl TemplateEngine for Verbatim {
    fn render_str(&self, text: &str, _scope: &Resource) -> Result<String> {
        Ok(text.to_string())
    }
}

/// The enclosing execution scope shared by a run's resources
#[derive(Clone)]
pub struct Context {
    fact_source: Arc<dyn FactSource>,
    template_engine: Arc<dyn TemplateEngine>,
}

impl Context {
    pub fn new(fact_source: Arc<dyn FactSource>, template_engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            fact_source,
            template_engine,
        }
    }

    /// A fresh facts snapshot; never cached here
    pub fn facts(&self) -> Facts {
        self.fact_source.snapshot()
    }

    pub fn render_str(&self, text: &str, scope: &Resource) -> Result<String> {
        self.template_engine.render_str(text, scope)
    }

    pub fn render_file(&self, path: &Path, scope: &Resource) -> Result<String> {
        self.template_engine.render_file(path, scope)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Arc::new(StaticFacts::default()), Arc::new(Verbatim))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("fact_source", &self.fact_source)
            .field("template_engine", &self.template_engine)
            .finish()
    }
}
