//! File resource - declared files on disk

use anyhow::{Context as _, Result, bail};
use dispatch::{
    ApplyContext, BindError, FieldBag, FieldDef, FieldKind, FieldSpec, FieldValue, Origin, Outcome,
    Provider, ProviderCore, ProviderCtor, Resource, ResourceType, Schema,
};
use std::fs;
use std::path::{Path, PathBuf};

/// A file whose presence, contents, and mode are declared
///
/// `method = "touch"` selects the variant that only ensures existence
/// and never rewrites contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct File;

impl ResourceType for File {
    fn name(&self) -> &'static str {
        "file"
    }

    fn schema(&self) -> Schema {
        Schema::Fixed(
            FieldSpec::new()
                .field("path", FieldDef::required().kind(FieldKind::String))
                .field(
                    "state",
                    FieldDef::new().kind(FieldKind::String).default_value("present"),
                )
                .field("content", FieldDef::new().kind(FieldKind::String))
                .field("mode", FieldDef::new().kind(FieldKind::String)),
        )
    }

    fn validate(&self, resource: &Resource) -> Result<(), BindError> {
        if let Some(path) = resource.field("path").and_then(FieldValue::as_str) {
            if !(path.starts_with('/') || path.starts_with('~')) {
                return Err(BindError::validation(
                    self.name(),
                    "path",
                    "must be absolute or start with ~",
                ));
            }
        }
        if let Some(state) = resource.field("state").and_then(FieldValue::as_str) {
            if !matches!(state, "present" | "absent") {
                return Err(BindError::validation(
                    self.name(),
                    "state",
                    "must be 'present' or 'absent'",
                ));
            }
        }
        if let Some(mode) = resource.field("mode").and_then(FieldValue::as_str) {
            if u32::from_str_radix(mode, 8).is_err() {
                return Err(BindError::validation(
                    self.name(),
                    "mode",
                    "must be an octal string like '0644'",
                ));
            }
        }
        Ok(())
    }

    fn default_provider(&self) -> ProviderCtor {
        FileProvider::boxed
    }

    fn provider_for(&self, method: &str) -> Option<ProviderCtor> {
        match method {
            "touch" => Some(TouchProvider::boxed as ProviderCtor),
            _ => None,
        }
    }
}

/// Desired state parsed out of a provider's field bag
#[derive(Debug)]
struct DesiredFile {
    path: PathBuf,
    state: FileState,
    content: Option<String>,
    mode: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Present,
    Absent,
}

impl DesiredFile {
    fn from_bag(bag: &FieldBag) -> Result<Self> {
        let path = crate::paths::expand(bag.require_str("path")?);
        let state = match bag.str("state").unwrap_or("present") {
            "absent" => FileState::Absent,
            _ => FileState::Present,
        };
        let content = bag.str("content").map(ToString::to_string);
        let mode = bag
            .str("mode")
            .map(|mode| {
                u32::from_str_radix(mode, 8).with_context(|| format!("invalid mode '{mode}'"))
            })
            .transpose()?;
        Ok(Self {
            path,
            state,
            content,
            mode,
        })
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create parent directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let current = fs::metadata(path)
        .with_context(|| format!("Could not stat {}", path.display()))?
        .permissions()
        .mode()
        & 0o7777;
    if current == mode {
        return Ok(false);
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Could not chmod {}", path.display()))?;
    Ok(true)
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> Result<bool> {
    Ok(false)
}

/// Default provider: converges presence, contents, and mode
#[derive(Debug)]
pub struct FileProvider {
    core: ProviderCore,
}

impl FileProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }
}

impl Provider for FileProvider {
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

        let desired = DesiredFile::from_bag(self.core.fields())?;

        if desired.state == FileState::Absent {
            if desired.path.exists() {
                fs::remove_file(&desired.path)
                    .with_context(|| format!("Could not remove {}", desired.path.display()))?;
                return Ok(Outcome::Removed);
            }
            return Ok(Outcome::NoChange);
        }

        // Unreadable or non-UTF-8 contents count as differing
        let existing = if desired.path.exists() {
            fs::read_to_string(&desired.path).ok()
        } else {
            None
        };

        let mut outcome = match (&existing, &desired.content) {
            (Some(_), None) => Outcome::NoChange,
            (Some(existing), Some(content)) if existing == content => Outcome::NoChange,
            (Some(_), Some(content)) => {
                write_file(&desired.path, content)?;
                Outcome::Modified
            }
            (None, content) => {
                write_file(&desired.path, content.as_deref().unwrap_or(""))?;
                Outcome::Created
            }
        };

        if let Some(mode) = desired.mode {
            if apply_mode(&desired.path, mode)? && outcome == Outcome::NoChange {
                outcome = Outcome::Modified;
            }
        }

        Ok(outcome)
    }
}

/// `touch` variant: ensures the file exists, never touches contents
#[derive(Debug)]
pub struct TouchProvider {
    core: ProviderCore,
}

impl TouchProvider {
    pub fn boxed(origin: Origin) -> Box<dyn Provider> {
        Box::new(Self {
            core: ProviderCore::new(origin),
        })
    }
}

impl Provider for TouchProvider {
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

        let desired = DesiredFile::from_bag(self.core.fields())?;
        if desired.state == FileState::Absent {
            bail!("touch cannot ensure absence; declare state = \"present\"");
        }

        if desired.path.exists() {
            return Ok(Outcome::NoChange);
        }
        write_file(&desired.path, "")?;
        Ok(Outcome::Created)
    }
}
