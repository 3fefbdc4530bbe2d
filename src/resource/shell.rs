//! Shell resource - arbitrary commands
//!
//! The one open-schema type: any named arguments are accepted and handed
//! to the provider verbatim. Open types skip lookup resolution, so every
//! field here must be a literal; a deferred value would reach the
//! provider unevaluated.

use anyhow::{Context as _, Result, bail};
use dispatch::{
    ApplyContext, BindError, Origin, Outcome, Provider, ProviderCore, ProviderCtor, Resource,
    ResourceType, Schema,
};
use std::process::Command;

/// A command to run during apply
#[derive(Debug, Clone, Copy, Default)]
pub struct Shell;

impl ResourceType for Shell {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn schema(&self) -> Schema {
        Schema::Open
    }

    fn validate(&self, resource: &Resource) -> Result<(), BindError> {
        // Open schema: check raw kwargs, there are no derived fields
        match resource.kwargs().get("cmd") {
            Some(value) if value.as_str().is_some() => Ok(()),
            Some(_) => Err(BindError::validation(
                self.name(),
                "cmd",
                "must be a literal string",
            )),
            None => Err(BindError::validation(
                self.name(),
                "cmd",
                "required field is missing",
            )),
        }
    }

    fn default_provider(&self) -> ProviderCtor {
        ShellProvider::boxed
    }
}

/// Runs the declared command through `sh -c`
#[derive(Debug)]
pub struct ShellProvider {
    core: ProviderCore,
}

impl ShellProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }
}

impl Provider for ShellProvider {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }

    fn apply(&mut self, ctx: &ApplyContext) -> Result<Outcome> {
        if ctx.dry_run {
            return Ok(Outcome::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let cmd = self.core.fields().require_str("cmd")?;
        let output = Command::new("sh")
            .args(["-c", cmd])
            .output()
            .context("Failed to run shell command")?;
        if !output.status.success() {
            bail!(
                "command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(Outcome::Modified)
    }
}
