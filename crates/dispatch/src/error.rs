//! Error taxonomy for the binding layer
//!
//! The binding layer is fail-fast: nothing here is retried or converted.
//! Lookup evaluation failures pass through unmodified; everything else is
//! a typed error naming the resource type that triggered it.

use thiserror::Error;

/// Errors raised while validating a resource or binding it to a provider
#[derive(Debug, Error)]
pub enum BindError {
    /// Declared state violates schema or domain rules
    #[error("{type_name}: invalid field '{field}': {reason}")]
    Validation {
        type_name: String,
        field: String,
        reason: String,
    },

    /// An explicit `method` entry named a provider variant the type does not offer
    #[error("{type_name}: unknown provider variant '{method}'")]
    UnknownProviderVariant {
        type_name: String,
        method: String,
    },

    /// A lookup failed during provider field resolution; propagated unmodified
    #[error(transparent)]
    Lookup(#[from] anyhow::Error),

    /// A context-dependent accessor was used before `attach` was called
    #[error("{type_name}: no execution context attached")]
    ContextNotAttached { type_name: String },

    /// A declaration referenced a type name missing from the registry
    #[error("unknown resource type '{name}'")]
    UnknownType { name: String },
}

impl BindError {
    /// Convenience constructor for domain validation failures
    pub fn validation(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}
