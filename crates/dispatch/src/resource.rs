//! Declared resources and provider binding
//!
//! A resource is the declarative side of the system: a type definition,
//! the raw kwargs the user wrote, and the schema-derived field values.
//! [`Resource::provider`] is the seam to the imperative side - it selects
//! a provider, value-copies the declared fields into it, and evaluates
//! any deferred values so the provider only ever sees concrete data.

use crate::context::{Context, Facts};
use crate::error::BindError;
use crate::lookup::Lookup;
use crate::provider::{Origin, Provider, ProviderCtor};
use crate::schema::Schema;
use crate::value::{FieldValue, Kwargs};
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Kwargs entry naming a provider variant instead of a field
const METHOD: &str = "method";

/// Static description and behavior of one resource type
///
/// Registered once at definition time; instances reference it through an
/// `Arc`. The schema is the single source of truth for field copy and
/// resolution.
pub trait ResourceType: Send + Sync + fmt::Debug {
    /// Declared name of this type (e.g. "file", "package")
    fn name(&self) -> &'static str;

    /// Field schema for declarations of this type
    fn schema(&self) -> Schema;

    /// Domain validation beyond the schema
    ///
    /// Runs after schema checks; must not mutate the resource. The
    /// default accepts anything.
    fn validate(&self, resource: &Resource) -> Result<(), BindError> {
        let _ = resource;
        Ok(())
    }

    /// Provider used when the declaration names no variant
    fn default_provider(&self) -> ProviderCtor;

    /// Named provider variants selectable via a `method` entry
    ///
    /// The default offers none, so any explicit `method` fails with
    /// [`BindError::UnknownProviderVariant`].
    fn provider_for(&self, method: &str) -> Option<ProviderCtor> {
        let _ = method;
        None
    }
}

/// A declared desired-state object bound to its type definition
///
/// Lifecycle: constructed by the declaration layer, `attach`ed to the
/// run's context, validated once, then asked for providers zero or more
/// times. Kwargs are immutable after construction; every derived value
/// is computed, never written back.
#[derive(Debug, Clone)]
pub struct Resource {
    type_def: Arc<dyn ResourceType>,
    schema: Schema,
    kwargs: Kwargs,
    fields: IndexMap<String, FieldValue>,
    context: Option<Arc<Context>>,
}

impl Resource {
    /// Build a resource, deriving per-field attribute values
    ///
    /// For fixed schemas each spec field gets the declared value, or the
    /// schema default when the declaration omits it; fields that are
    /// absent and have no default stay unset until `validate` flags
    /// them. Open schemas derive nothing - kwargs are the fields.
    pub fn new(type_def: Arc<dyn ResourceType>, kwargs: Kwargs) -> Self {
        let schema = type_def.schema();
        let mut fields = IndexMap::new();
        if let Schema::Fixed(spec) = &schema {
            for (name, def) in spec.iter() {
                if let Some(value) = kwargs.get(name) {
                    fields.insert(name.to_string(), value.clone());
                } else if let Some(default) = def.default() {
                    fields.insert(name.to_string(), FieldValue::Literal(default.clone()));
                }
            }
        }
        Self {
            type_def,
            schema,
            kwargs,
            fields,
            context: None,
        }
    }

    pub fn type_name(&self) -> &str {
        self.type_def.name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Raw construction arguments, as declared
    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// Derived attribute value of a schema field (defaults applied)
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set the enclosing execution context
    ///
    /// The engine calls this exactly once, before `validate`, `facts`,
    /// `template`, or `provider` are used.
    pub fn attach(&mut self, context: Arc<Context>) {
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&Arc<Context>> {
        self.context.as_ref()
    }

    fn require_context(&self) -> Result<&Context, BindError> {
        self.context.as_deref().ok_or_else(|| BindError::ContextNotAttached {
            type_name: self.type_name().to_string(),
        })
    }

    /// Fresh facts snapshot scoped to this resource's context
    pub fn facts(&self) -> anyhow::Result<Facts> {
        Ok(self.require_context()?.facts())
    }

    /// Render a template string with this resource as the scope
    pub fn template(&self, msg: &str) -> anyhow::Result<String> {
        self.require_context()?.render_str(msg, self)
    }

    /// Render a template file with this resource as the scope
    pub fn template_file(&self, path: &Path) -> anyhow::Result<String> {
        self.require_context()?.render_file(path, self)
    }

    /// Check the declaration against the schema, then the type's rules
    ///
    /// Never mutates. The engine must not call [`Resource::provider`]
    /// for a resource that failed here.
    pub fn validate(&self) -> Result<(), BindError> {
        if let Schema::Fixed(spec) = &self.schema {
            for (name, def) in spec.iter() {
                match self.fields.get(name) {
                    None => {
                        if def.is_required() {
                            return Err(BindError::validation(
                                self.type_name(),
                                name,
                                "required field is missing",
                            ));
                        }
                    }
                    Some(FieldValue::Literal(value)) => {
                        if let Some(kind) = def.expected_kind() {
                            if !kind.matches(value) {
                                return Err(BindError::validation(
                                    self.type_name(),
                                    name,
                                    format!("expected {}", kind.name()),
                                ));
                            }
                        }
                    }
                    // Deferred values cannot be kind-checked until resolution
                    Some(FieldValue::Deferred(_)) => {}
                }
            }
        }
        self.type_def.validate(self)
    }

    /// Select, construct, and populate the provider for this resource
    ///
    /// Each call yields a fresh, independent provider; nothing is shared
    /// between two providers beyond the immutable resource they were
    /// derived from.
    pub fn provider(&self) -> Result<Box<dyn Provider>, BindError> {
        let ctor = self.select_provider()?;
        let mut provider = ctor(self.origin());
        self.copy_fields(provider.as_mut());
        self.resolve_fields(provider.as_mut())?;
        log::debug!(
            "{self}: bound provider with {} fields",
            provider.core().fields().len()
        );
        Ok(provider)
    }

    /// Resolve the provider constructor: explicit `method` entry wins,
    /// otherwise the type's default
    fn select_provider(&self) -> Result<ProviderCtor, BindError> {
        let Some(requested) = self.kwargs.get(METHOD) else {
            return Ok(self.type_def.default_provider());
        };
        match requested.as_str() {
            Some(method) => self.type_def.provider_for(method).ok_or_else(|| {
                BindError::UnknownProviderVariant {
                    type_name: self.type_name().to_string(),
                    method: method.to_string(),
                }
            }),
            // A variant name must be a literal string; anything else
            // cannot name a provider
            None => Err(BindError::UnknownProviderVariant {
                type_name: self.type_name().to_string(),
                method: requested.describe(),
            }),
        }
    }

    /// Value-copy declared fields into the provider's bag
    ///
    /// Open types copy every kwargs entry verbatim, `method` included.
    /// Fixed types copy exactly the schema's fields, reading the derived
    /// attribute values rather than raw kwargs; entries outside the
    /// schema are never copied.
    fn copy_fields(&self, provider: &mut dyn Provider) {
        let bag = provider.core_mut().fields_mut();
        match &self.schema {
            Schema::Open => {
                for (name, value) in self.kwargs.iter() {
                    bag.set(name, value.clone());
                }
            }
            Schema::Fixed(spec) => {
                for name in spec.names() {
                    if let Some(value) = self.fields.get(name) {
                        bag.set(name, value.clone());
                    }
                }
            }
        }
    }

    /// Evaluate deferred values sitting in the provider's bag
    ///
    /// Fixed schemas only: each deferred field is evaluated once against
    /// this resource and overwritten with its result; literals pass
    /// through untouched. Open types skip resolution entirely (see
    /// [`Schema::Open`]). On failure the fields resolved so far stay
    /// set; the caller discards the half-built provider.
    fn resolve_fields(&self, provider: &mut dyn Provider) -> Result<(), BindError> {
        let Schema::Fixed(spec) = &self.schema else {
            return Ok(());
        };
        for name in spec.names() {
            let lookup: Arc<dyn Lookup> = match provider.core().fields().get(name) {
                Some(FieldValue::Deferred(lookup)) => Arc::clone(lookup),
                _ => continue,
            };
            let value = lookup.evaluate(self)?;
            provider
                .core_mut()
                .fields_mut()
                .set(name, FieldValue::Literal(value));
        }
        Ok(())
    }

    /// Identity handed to providers, for logging only
    pub fn origin(&self) -> Origin {
        Origin::new(self.type_name(), self.to_string())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())?;
        if let Some(name) = self.kwargs.get("name") {
            write!(f, ": {}", name.describe())?;
        }
        if let Some(signals) = self.kwargs.get("signals") {
            write!(f, " (signals: {})", signals.describe())?;
        }
        if let Some(handles) = self.kwargs.get("handles") {
            write!(f, " (handles: {})", handles.describe())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticFacts;
    use crate::provider::{ApplyContext, Outcome, ProviderCore};
    use crate::schema::{FieldDef, FieldKind, FieldSpec};
    use anyhow::bail;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct EchoProvider {
        core: ProviderCore,
    }

    impl EchoProvider {
        fn boxed(origin: Origin) -> Box<dyn Provider> {
            Box::new(Self {
                core: ProviderCore::new(origin),
            })
        }
    }

    impl Provider for EchoProvider {
        fn core(&self) -> &ProviderCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ProviderCore {
            &mut self.core
        }

        fn apply(&mut self, _ctx: &ApplyContext) -> anyhow::Result<Outcome> {
            Ok(Outcome::NoChange)
        }
    }

    #[derive(Debug)]
    struct AltProvider {
        core: ProviderCore,
    }

    impl AltProvider {
        fn boxed(origin: Origin) -> Box<dyn Provider> {
            Box::new(Self {
                core: ProviderCore::new(origin),
            })
        }
    }

    impl Provider for AltProvider {
        fn core(&self) -> &ProviderCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ProviderCore {
            &mut self.core
        }

        fn apply(&mut self, _ctx: &ApplyContext) -> anyhow::Result<Outcome> {
            Ok(Outcome::NoChange)
        }
    }

    /// Fixed-schema type: required path, defaulted mode, absolute paths only
    #[derive(Debug)]
    struct FileType;

    impl ResourceType for FileType {
        fn name(&self) -> &'static str {
            "file"
        }

        fn schema(&self) -> Schema {
            Schema::Fixed(
                FieldSpec::new()
                    .field("path", FieldDef::required().kind(FieldKind::String))
                    .field("mode", FieldDef::new().default_value("0644")),
            )
        }

        fn validate(&self, resource: &Resource) -> Result<(), BindError> {
            if let Some(path) = resource.field("path").and_then(FieldValue::as_str) {
                if !path.starts_with('/') {
                    return Err(BindError::validation(self.name(), "path", "must be absolute"));
                }
            }
            Ok(())
        }

        fn default_provider(&self) -> ProviderCtor {
            EchoProvider::boxed
        }

        fn provider_for(&self, method: &str) -> Option<ProviderCtor> {
            (method == "alt").then_some(AltProvider::boxed as ProviderCtor)
        }
    }

    /// Open-schema type accepting arbitrary kwargs
    #[derive(Debug)]
    struct BagType;

    impl ResourceType for BagType {
        fn name(&self) -> &'static str {
            "bag"
        }

        fn schema(&self) -> Schema {
            Schema::Open
        }

        fn default_provider(&self) -> ProviderCtor {
            EchoProvider::boxed
        }

        fn provider_for(&self, method: &str) -> Option<ProviderCtor> {
            (method == "custom").then_some(EchoProvider::boxed as ProviderCtor)
        }
    }

    #[derive(Debug)]
    struct ConstLookup(Value);

    impl Lookup for ConstLookup {
        fn evaluate(&self, _resource: &Resource) -> anyhow::Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct FailingLookup;

    impl Lookup for FailingLookup {
        fn evaluate(&self, _resource: &Resource) -> anyhow::Result<Value> {
            bail!("fact service unreachable")
        }
    }

    #[derive(Debug)]
    struct CountingLookup(Arc<AtomicUsize>);

    impl Lookup for CountingLookup {
        fn evaluate(&self, _resource: &Resource) -> anyhow::Result<Value> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!("counted"))
        }
    }

    fn file_resource(kwargs: Kwargs) -> Resource {
        Resource::new(Arc::new(FileType), kwargs)
    }

    fn bag_resource(kwargs: Kwargs) -> Resource {
        Resource::new(Arc::new(BagType), kwargs)
    }

    #[test]
    fn test_fixed_copy_uses_spec_fields_only() {
        let resource = file_resource(
            Kwargs::new()
                .set("path", "/etc/motd")
                .set("junk", "ignored")
                .set("name", "motd"),
        );

        let provider = resource.provider().unwrap();
        let bag = provider.core().fields();
        assert_eq!(bag.str("path"), Some("/etc/motd"));
        assert_eq!(bag.str("mode"), Some("0644")); // schema default, derived attribute
        assert!(!bag.contains("junk"));
        assert!(!bag.contains("name"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_open_copy_copies_every_kwarg_verbatim() {
        let resource = bag_resource(
            Kwargs::new()
                .set("a", 1_i64)
                .set("b", 2_i64)
                .set("method", "custom"),
        );

        let provider = resource.provider().unwrap();
        let bag = provider.core().fields();
        assert_eq!(bag.literal("a"), Some(&json!(1)));
        assert_eq!(bag.literal("b"), Some(&json!(2)));
        // On an open type, method is a plain field besides selecting the variant
        assert_eq!(bag.str("method"), Some("custom"));
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_open_schema_leaves_deferred_values_unevaluated() {
        let resource = bag_resource(
            Kwargs::new().set("late", FieldValue::deferred(ConstLookup(json!("never")))),
        );

        let provider = resource.provider().unwrap();
        assert!(provider.core().fields().get("late").unwrap().is_deferred());
    }

    #[test]
    fn test_lookup_resolved_to_concrete_value() {
        let resource = file_resource(
            Kwargs::new()
                .set("path", "/etc/x")
                .set("mode", FieldValue::deferred(ConstLookup(json!("0600")))),
        );

        let provider = resource.provider().unwrap();
        let bag = provider.core().fields();
        assert_eq!(bag.str("path"), Some("/etc/x"));
        assert_eq!(bag.str("mode"), Some("0600"));
        assert!(!bag.get("mode").unwrap().is_deferred());
        // The resource side still holds the deferred declaration
        assert!(resource.field("mode").unwrap().is_deferred());
    }

    #[test]
    fn test_lookup_evaluated_once_per_provider() {
        let count = Arc::new(AtomicUsize::new(0));
        let resource = file_resource(
            Kwargs::new()
                .set("path", "/etc/x")
                .set("mode", FieldValue::deferred(CountingLookup(Arc::clone(&count)))),
        );

        resource.provider().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        resource.provider().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lookup_failure_propagates_unmodified() {
        let resource = file_resource(
            Kwargs::new()
                .set("path", "/etc/x")
                .set("mode", FieldValue::deferred(FailingLookup)),
        );

        let err = resource.provider().unwrap_err();
        assert!(matches!(err, BindError::Lookup(_)));
        assert_eq!(err.to_string(), "fact service unreachable");
    }

    #[test]
    fn test_unknown_method_is_an_error() {
        let resource = file_resource(Kwargs::new().set("path", "/etc/x").set("method", "rsync"));

        let err = resource.provider().unwrap_err();
        match err {
            BindError::UnknownProviderVariant { type_name, method } => {
                assert_eq!(type_name, "file");
                assert_eq!(method, "rsync");
            }
            other => panic!("expected UnknownProviderVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_method_is_an_error() {
        let resource = file_resource(Kwargs::new().set("path", "/etc/x").set("method", 7_i64));
        assert!(matches!(
            resource.provider(),
            Err(BindError::UnknownProviderVariant { .. })
        ));
    }

    #[test]
    fn test_method_selects_named_variant() {
        let resource = file_resource(Kwargs::new().set("path", "/etc/x").set("method", "alt"));

        let provider = resource.provider().unwrap();
        assert!(format!("{provider:?}").contains("AltProvider"));
        // Fixed schema: method is not a spec field, so it is not copied
        assert!(!provider.core().fields().contains("method"));
    }

    #[test]
    fn test_two_providers_are_independent() {
        let resource = file_resource(Kwargs::new().set("path", "/etc/x"));

        let mut first = resource.provider().unwrap();
        let second = resource.provider().unwrap();

        first
            .core_mut()
            .fields_mut()
            .set("path", FieldValue::from("/tmp/other"));

        assert_eq!(second.core().fields().str("path"), Some("/etc/x"));
        assert_eq!(resource.field("path").unwrap().as_str(), Some("/etc/x"));
    }

    #[test]
    fn test_validate_missing_required_field() {
        let resource = file_resource(Kwargs::new().set("mode", "0600"));

        let err = resource.validate().unwrap_err();
        match err {
            BindError::Validation { type_name, field, .. } => {
                assert_eq!(type_name, "file");
                assert_eq!(field, "path");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_kind_mismatch() {
        let resource = file_resource(Kwargs::new().set("path", 42_i64));
        assert!(matches!(
            resource.validate(),
            Err(BindError::Validation { .. })
        ));
    }

    #[test]
    fn test_validate_domain_rule() {
        let resource = file_resource(Kwargs::new().set("path", "relative/path"));

        let err = resource.validate().unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn test_validate_accepts_deferred_without_kind_check() {
        let resource = file_resource(
            Kwargs::new().set("path", FieldValue::deferred(ConstLookup(json!("/etc/x")))),
        );
        assert!(resource.validate().is_ok());
    }

    #[test]
    fn test_facts_and_template_require_attached_context() {
        let mut resource = file_resource(Kwargs::new().set("path", "/etc/x"));

        let err = resource.facts().unwrap_err();
        assert!(err.to_string().contains("no execution context attached"));

        let context = Context::new(
            Arc::new(StaticFacts::new(Facts::new().with("os", "linux"))),
            Arc::new(crate::context::Verbatim),
        );
        resource.attach(Arc::new(context));

        assert_eq!(resource.facts().unwrap().str("os"), Some("linux"));
        assert_eq!(resource.template("no interpolation").unwrap(), "no interpolation");
    }

    #[test]
    fn test_display_label() {
        let resource = file_resource(
            Kwargs::new()
                .set("path", "/etc/nginx.conf")
                .set("name", "nginx config")
                .set("signals", "restart-nginx"),
        );

        assert_eq!(
            resource.to_string(),
            "file: nginx config (signals: restart-nginx)"
        );
    }
}
