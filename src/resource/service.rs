//! Service resource - restart running services

use anyhow::{Context as _, Result};
use dispatch::{
    ApplyContext, FieldDef, FieldKind, FieldSpec, Origin, Outcome, Provider, ProviderCore,
    ProviderCtor, ResourceType, Schema,
};
use std::process::Command;

/// A service to restart once its declaration is applied
#[derive(Debug, Clone, Copy, Default)]
pub struct Service;

impl ResourceType for Service {
    fn name(&self) -> &'static str {
        "service"
    }

    fn schema(&self) -> Schema {
        Schema::Fixed(FieldSpec::new().field("name", FieldDef::required().kind(FieldKind::String)))
    }

    fn default_provider(&self) -> ProviderCtor {
        RestartProvider::boxed
    }
}

/// Restarts the named process via killall
#[derive(Debug)]
pub struct RestartProvider {
    core: ProviderCore,
}

impl RestartProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }

    /// Check if the service is running
    fn is_running(name: &str) -> bool {
        Command::new("pgrep")
            .args(["-x", name])
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn restart(name: &str) -> Result<bool> {
        let status = Command::new("killall")
            .arg(name)
            .status()
            .context("Failed to execute killall")?;
        Ok(status.success())
    }
}

impl Provider for RestartProvider {
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

        let name = self.core.fields().require_str("name")?.to_string();
        if !Self::is_running(&name) {
            return Ok(Outcome::Skipped {
                reason: format!("{name} is not running"),
            });
        }

        if Self::restart(&name)? {
            Ok(Outcome::Modified)
        } else {
            Ok(Outcome::Skipped {
                reason: format!("{name} was not running"),
            })
        }
    }
}
