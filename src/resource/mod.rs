//! Built-in resource types
//!
//! Every operation steward can converge is declared as a typed resource:
//! a schema, validation rules, and one or more providers. The registry
//! built here is what the declaration layer instantiates against.

use dispatch::TypeRegistry;
use std::sync::Arc;

pub mod file;
pub mod package;
pub mod service;
pub mod shell;

pub use file::File;
pub use package::Package;
pub use service::Service;
pub use shell::Shell;

/// Registry with every built-in type registered
pub fn builtin_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(Arc::new(File));
    registry.register(Arc::new(Package));
    registry.register(Arc::new(Service));
    registry.register(Arc::new(Shell));
    registry
}
