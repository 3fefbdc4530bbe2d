//! # Steward
//!
//! Declarative system configuration: declare desired state as typed
//! resources; steward binds each declaration to the provider that knows
//! how to converge it and applies the result.
//!
//! The binding core - schemas, deferred lookups, provider dispatch -
//! lives in the `dispatch` crate. This crate supplies the host-facing
//! pieces: fact gathering, template interpolation, the concrete lookups,
//! the built-in resource types, manifest loading, and the sequential
//! runner.
//!
//! ## Example
//!
//! ```no_run
//! use steward::{Manifest, RunOptions, Runner, builtin_registry};
//!
//! # fn main() -> anyhow::Result<()> {
//! let manifest = Manifest::load(std::path::Path::new("steward.toml"))?;
//! let resources = manifest.resources(&builtin_registry())?;
//! let summary = Runner::with_host_defaults().run(resources, &RunOptions::default())?;
//! println!("{} changes", summary.total_changes());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod facts;
pub mod lookups;
pub mod paths;
pub mod resource;
pub mod template;

pub use config::{Declaration, Manifest};
pub use engine::{RunOptions, Runner};
pub use facts::HostFacts;
pub use lookups::{EnvLookup, FactLookup, FileContentsLookup, TemplateLookup};
pub use resource::{File, Package, Service, Shell, builtin_registry};
pub use template::Interpolator;
