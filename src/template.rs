//! Template interpolation
//!
//! Replaces `{{ field }}` and `{{ facts.name }}` references in text with
//! values from the scope resource and its context. This is the whole
//! template language: no conditionals, no loops - declarations that need
//! logic belong in a lookup.

use anyhow::{Result, anyhow, bail};
use dispatch::{FieldValue, Resource, TemplateEngine};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.]*)\s*\}\}").expect("reference pattern is valid")
    })
}

/// Template engine resolving references against a scope resource
///
/// `{{ name }}` reads the scope's field of that name (falling back to
/// raw kwargs for open-schema scopes); `{{ facts.name }}` reads a fact
/// from the scope's context. Unknown references are errors rather than
/// silently left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolator;

impl Interpolator {
    pub fn new() -> Self {
        Self
    }

    fn resolve(self, reference: &str, scope: &Resource) -> Result<String> {
        if let Some(fact) = reference.strip_prefix("facts.") {
            let facts = scope.facts()?;
            let value = facts
                .get(fact)
                .ok_or_else(|| anyhow!("unknown fact '{fact}'"))?;
            return Ok(text_of(value));
        }

        let field = scope
            .field(reference)
            .or_else(|| scope.kwargs().get(reference));
        match field {
            Some(FieldValue::Literal(value)) => Ok(text_of(value)),
            Some(FieldValue::Deferred(_)) => {
                bail!("field '{reference}' is deferred and cannot be interpolated")
            }
            None => bail!("unknown template reference '{reference}'"),
        }
    }
}

impl TemplateEngine for Interpolator {
    fn render_str(&self, text: &str, scope: &Resource) -> Result<String> {
        let mut rendered = String::with_capacity(text.len());
        let mut last = 0;
        for caps in reference_pattern().captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            rendered.push_str(&text[last..whole.start()]);
            rendered.push_str(&self.resolve(&caps[1], scope)?);
            last = whole.end();
        }
        rendered.push_str(&text[last..]);
        Ok(rendered)
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch::{
        Context, Facts, Kwargs, ProviderCtor, ResourceType, Schema, StaticFacts,
    };
    use dispatch::{ApplyContext, Origin, Outcome, Provider, ProviderCore};
    use std::sync::Arc;

    #[derive(Debug)]
    struct NullProvider {
        core: ProviderCore,
    }

    impl NullProvider {
        fn boxed(origin: Origin) -> Box<dyn Provider> {
            Box::new(Self {
                core: ProviderCore::new(origin),
            })
        }
    }

    impl Provider for NullProvider {
        fn core(&self) -> &ProviderCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ProviderCore {
            &mut self.core
        }

        fn apply(&mut self, _ctx: &ApplyContext) -> Result<Outcome> {
            Ok(Outcome::NoChange)
        }
    }

    #[derive(Debug)]
    struct ScopeType;

    impl ResourceType for ScopeType {
        fn name(&self) -> &'static str {
            "scope"
        }

        fn schema(&self) -> Schema {
            Schema::Open
        }

        fn default_provider(&self) -> ProviderCtor {
            NullProvider::boxed
        }
    }

    fn scoped_resource(kwargs: Kwargs) -> Resource {
        let mut resource = Resource::new(Arc::new(ScopeType), kwargs);
        let context = Context::new(
            Arc::new(StaticFacts::new(
                Facts::new().with("os", "linux").with("cpus", 8_i64),
            )),
            Arc::new(Interpolator::new()),
        );
        resource.attach(Arc::new(context));
        resource
    }

    #[test]
    fn test_render_field_and_fact_references() {
        let resource = scoped_resource(Kwargs::new().set("name", "web").set("port", 8080_i64));

        let rendered = resource
            .template("{{ name }} on {{ facts.os }} port {{ port }}")
            .unwrap();
        assert_eq!(rendered, "web on linux port 8080");
    }

    #[test]
    fn test_render_leaves_plain_text_alone() {
        let resource = scoped_resource(Kwargs::new());
        assert_eq!(resource.template("no references here").unwrap(), "no references here");
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let resource = scoped_resource(Kwargs::new());
        let err = resource.template("{{ missing }}").unwrap_err();
        assert!(err.to_string().contains("unknown template reference"));
    }

    #[test]
    fn test_unknown_fact_is_an_error() {
        let resource = scoped_resource(Kwargs::new());
        let err = resource.template("{{ facts.missing }}").unwrap_err();
        assert!(err.to_string().contains("unknown fact"));
    }
}
