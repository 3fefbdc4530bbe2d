//! Deferred value evaluation
//!
//! A lookup stands in for a value that is not known until the resource is
//! bound to a provider: the contents of a file, a host fact, a rendered
//! template. The binding layer evaluates each deferred field exactly once
//! per provider construction, against the resource that declared it.

use crate::resource::Resource;
use anyhow::Result;
use serde_json::Value;
use std::fmt;

/// A value computed at provider-construction time
///
/// Implementations may consult facts, render templates, or inspect other
/// resources reachable from the owning resource's context. Evaluation
/// must have no visible side effect beyond the returned value; whether
/// repeated evaluation is idempotent is the implementation's own concern.
/// Failures propagate to the caller of [`Resource::provider`] unmodified.
pub trait Lookup: Send + Sync + fmt::Debug {
    /// Compute the concrete value, using the owning resource as context
    fn evaluate(&self, resource: &Resource) -> Result<Value>;
}
