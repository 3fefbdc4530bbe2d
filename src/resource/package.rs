//! Package resource - installed software
//!
//! Declares a package and lets the provider deal with the package
//! manager. Homebrew is the default; `method = "pnpm"` selects the
//! pnpm global-package variant.

use anyhow::{Context as _, Result, bail};
use dispatch::{
    ApplyContext, BindError, FieldBag, FieldDef, FieldKind, FieldSpec, FieldValue, Origin, Outcome,
    Provider, ProviderCore, ProviderCtor, Resource, ResourceType, Schema,
};
use std::process::Command;

/// A package whose installation state is declared
#[derive(Debug, Clone, Copy, Default)]
pub struct Package;

impl ResourceType for Package {
    fn name(&self) -> &'static str {
        "package"
    }

    fn schema(&self) -> Schema {
        Schema::Fixed(
            FieldSpec::new()
                .field("name", FieldDef::required().kind(FieldKind::String))
                .field(
                    "state",
                    FieldDef::new().kind(FieldKind::String).default_value("installed"),
                )
                .field("version", FieldDef::new().kind(FieldKind::String)),
        )
    }

    fn validate(&self, resource: &Resource) -> Result<(), BindError> {
        if let Some(state) = resource.field("state").and_then(FieldValue::as_str) {
            if !matches!(state, "installed" | "absent") {
                return Err(BindError::validation(
                    self.name(),
                    "state",
                    "must be 'installed' or 'absent'",
                ));
            }
        }
        Ok(())
    }

    fn default_provider(&self) -> ProviderCtor {
        BrewProvider::boxed
    }

    fn provider_for(&self, method: &str) -> Option<ProviderCtor> {
        match method {
            "brew" => Some(BrewProvider::boxed as ProviderCtor),
            "pnpm" => Some(PnpmProvider::boxed as ProviderCtor),
            _ => None,
        }
    }
}

/// Desired state parsed out of a provider's field bag
#[derive(Debug)]
struct DesiredPackage {
    name: String,
    state: PackageState,
    version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageState {
    Installed,
    Absent,
}

impl DesiredPackage {
    fn from_bag(bag: &FieldBag) -> Result<Self> {
        let name = bag.require_str("name")?.to_string();
        let state = match bag.str("state").unwrap_or("installed") {
            "absent" => PackageState::Absent,
            _ => PackageState::Installed,
        };
        let version = bag.str("version").map(ToString::to_string);
        Ok(Self { name, state, version })
    }

    /// Spec handed to the package manager, version pinned when declared
    fn install_spec(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

fn run_manager(manager: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(manager)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {manager}"))?;
    if !output.status.success() {
        bail!(
            "{manager} {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Installs via Homebrew
#[derive(Debug)]
pub struct BrewProvider {
    core: ProviderCore,
}

impl BrewProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }

    fn is_installed(name: &str) -> bool {
        Command::new("brew")
            .args(["list", "--versions", name])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Provider for BrewProvider {
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

        let desired = DesiredPackage::from_bag(self.core.fields())?;
        let installed = Self::is_installed(&desired.name);

        match desired.state {
            PackageState::Installed if installed => Ok(Outcome::NoChange),
            PackageState::Installed => {
                run_manager("brew", &["install", &desired.install_spec()])?;
                Ok(Outcome::Created)
            }
            PackageState::Absent if !installed => Ok(Outcome::NoChange),
            PackageState::Absent => {
                run_manager("brew", &["uninstall", &desired.name])?;
                Ok(Outcome::Removed)
            }
        }
    }
}

/// Installs global packages via pnpm
#[derive(Debug)]
pub struct PnpmProvider {
    core: ProviderCore,
}

impl PnpmProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }

    fn is_installed(name: &str) -> bool {
        Command::new("pnpm")
            .args(["list", "--global", "--depth", "0", name])
            .output()
            .map(|output| {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout).contains(name)
            })
            .unwrap_or(false)
    }
}

impl Provider for PnpmProvider {
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

        let desired = DesiredPackage::from_bag(self.core.fields())?;
        let installed = Self::is_installed(&desired.name);

        match desired.state {
            PackageState::Installed if installed => Ok(Outcome::NoChange),
            PackageState::Installed => {
                run_manager("pnpm", &["add", "--global", &desired.install_spec()])?;
                Ok(Outcome::Created)
            }
            PackageState::Absent if !installed => Ok(Outcome::NoChange),
            PackageState::Absent => {
                run_manager("pnpm", &["remove", "--global", &desired.name])?;
                Ok(Outcome::Removed)
            }
        }
    }
}
