//! # Dispatch
//!
//! Resource typing and provider dispatch for declarative configuration
//! management.
//!
//! This crate is the seam between declarative intent and imperative
//! execution: a declared resource selects the provider that will
//! converge it, its field values flow into that provider as value-copies,
//! and any deferred (lookup) values are evaluated along the way so the
//! provider only ever holds concrete data.
//!
//! ## Core Concepts
//!
//! - **Resource**: a declared desired-state object - raw kwargs plus a
//!   type definition
//! - **ResourceType**: the static description of one type - schema,
//!   validation rules, provider constructors
//! - **Schema**: `Fixed(FieldSpec)` constrains fields; `Open` accepts
//!   arbitrary named arguments
//! - **Provider**: the executable counterpart, populated by the binding
//!   layer and handed to the execution engine
//! - **Lookup**: a deferred value evaluated at provider-construction
//!   time against the owning resource
//!
//! ## Example
//!
//! ```ignore
//! use dispatch::{
//!     FieldDef, FieldKind, FieldSpec, Kwargs, Origin, Provider, ProviderCore,
//!     ProviderCtor, Resource, ResourceType, Schema,
//! };
//!
//! #[derive(Debug)]
//! struct FileType;
//!
//! impl ResourceType for FileType {
//!     fn name(&self) -> &'static str { "file" }
//!
//!     fn schema(&self) -> Schema {
//!         Schema::Fixed(
//!             FieldSpec::new()
//!                 .field("path", FieldDef::required().kind(FieldKind::String))
//!                 .field("mode", FieldDef::new().default_value("0644")),
//!         )
//!     }
//!
//!     fn default_provider(&self) -> ProviderCtor { FileProvider::boxed }
//! }
//!
//! let resource = Resource::new(
//!     std::sync::Arc::new(FileType),
//!     Kwargs::new().set("path", "/etc/motd"),
//! );
//! resource.validate()?;
//! let provider = resource.provider()?;
//! ```
//!
//! ## Collaborator Seams
//!
//! Facts gathering, template rendering, and convergence logic live
//! outside this crate, behind [`FactSource`], [`TemplateEngine`], and
//! [`Provider`]. The binding layer is single-threaded and synchronous;
//! it imposes no locking and assumes one writer per resource instance.

pub mod context;
pub mod error;
pub mod lookup;
pub mod provider;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod value;

// Re-export main types at crate root
pub use context::{Context, FactSource, Facts, StaticFacts, TemplateEngine, Verbatim};
pub use error::BindError;
pub use lookup::Lookup;
pub use provider::{
    ApplyContext, FieldBag, Origin, Outcome, Provider, ProviderCore, ProviderCtor, Summary,
};
pub use registry::TypeRegistry;
pub use resource::{Resource, ResourceType};
pub use schema::{FieldDef, FieldKind, FieldSpec, Schema};
pub use value::{FieldValue, Kwargs};
