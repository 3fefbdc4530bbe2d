//! Type registry
//!
//! Maps declared type names to their definitions. Populated once at
//! startup; the declaration layer instantiates resources through it so
//! every schema is attached at definition time, not per instance.

use crate::error::BindError;
use crate::resource::{Resource, ResourceType};
use crate::value::Kwargs;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Registration table of resource type definitions
#[derive(Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<dyn ResourceType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type definition under its declared name
    ///
    /// Re-registering a name replaces the previous definition.
    pub fn register(&mut self, type_def: Arc<dyn ResourceType>) {
        let name = type_def.name().to_string();
        if self.types.insert(name.clone(), type_def).is_some() {
            log::debug!("type '{name}' re-registered");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ResourceType>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build a resource from a declared type name and kwargs
    pub fn instantiate(&self, name: &str, kwargs: Kwargs) -> Result<Resource, BindError> {
        let type_def = self.get(name).ok_or_else(|| BindError::UnknownType {
            name: name.to_string(),
        })?;
        Ok(Resource::new(Arc::clone(type_def), kwargs))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
