//! Sequential apply runner
//!
//! Validates every declaration up front - no provider is constructed
//! while any resource is invalid - then binds and applies each one in
//! declaration order. Apply failures are tallied and the run continues;
//! binding failures stop the run, since a half-built provider must be
//! discarded.

use crate::facts::HostFacts;
use crate::template::Interpolator;
use anyhow::{Context as _, Result};
use dispatch::{ApplyContext, Context, Resource, Summary};
use std::sync::Arc;

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Drives resources through attach, validate, bind, and apply
pub struct Runner {
    context: Arc<Context>,
}

impl Runner {
    pub fn new(context: Context) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Runner wired to host facts and `{{ ... }}` interpolation
    pub fn with_host_defaults() -> Self {
        Self::new(Context::new(
            Arc::new(HostFacts),
            Arc::new(Interpolator::new()),
        ))
    }

    /// Apply resources in declaration order, returning the outcome tally
    pub fn run(&self, mut resources: Vec<Resource>, opts: &RunOptions) -> Result<Summary> {
        for resource in &mut resources {
            resource.attach(Arc::clone(&self.context));
        }

        for resource in &resources {
            resource
                .validate()
                .with_context(|| format!("invalid declaration: {resource}"))?;
        }

        let apply_ctx = ApplyContext::new(opts.dry_run, opts.verbose);
        let mut summary = Summary::default();
        for resource in &resources {
            let mut provider = resource.provider()?;
            match provider.apply(&apply_ctx) {
                Ok(outcome) => {
                    log::info!("{resource}: {outcome:?}");
                    summary.add(&outcome);
                }
                Err(error) => {
                    log::warn!("{resource}: apply failed: {error:#}");
                    summary.add_failure();
                }
            }
        }
        Ok(summary)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::with_host_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Manifest;
    use crate::resource::{File, Shell, builtin_registry};
    use dispatch::Kwargs;
    use std::fs;

    fn file_resource(path: &std::path::Path, content: &str) -> Resource {
        Resource::new(
            Arc::new(File),
            Kwargs::new()
                .set("path", path.to_string_lossy().to_string())
                .set("content", content),
        )
    }

    #[test]
    fn test_run_applies_in_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let resources = vec![
            file_resource(&dir.path().join("first"), "1"),
            file_resource(&dir.path().join("second"), "2"),
        ];

        let summary = Runner::with_host_defaults()
            .run(resources, &RunOptions::default())
            .unwrap();
        assert_eq!(summary.created, 2);
        assert!(summary.is_success());
        assert!(dir.path().join("first").exists());
        assert!(dir.path().join("second").exists());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let resources = vec![file_resource(&dir.path().join("phantom"), "x")];

        let summary = Runner::with_host_defaults()
            .run(
                resources,
                &RunOptions {
                    dry_run: true,
                    verbose: false,
                },
            )
            .unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_changes(), 0);
        assert!(!dir.path().join("phantom").exists());
    }

    #[test]
    fn test_invalid_declaration_stops_before_any_provider() {
        let dir = tempfile::tempdir().unwrap();
        let valid = file_resource(&dir.path().join("never"), "x");
        let invalid = Resource::new(Arc::new(File), Kwargs::new().set("path", "relative/path"));

        // The valid resource comes first, but validation of the whole
        // set happens before any provider is built
        let err = Runner::with_host_defaults()
            .run(vec![valid, invalid], &RunOptions::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("must be absolute"));
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn test_apply_failure_is_tallied_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let failing = Resource::new(Arc::new(Shell), Kwargs::new().set("cmd", "exit 9"));
        let ok = file_resource(&dir.path().join("after-failure"), "x");

        let summary = Runner::with_host_defaults()
            .run(vec![failing, ok], &RunOptions::default())
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert!(!summary.is_success());
        assert!(dir.path().join("after-failure").exists());
    }

    #[test]
    fn test_manifest_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("greeting");
        let toml = format!(
            r#"
[[resource]]
type = "file"
path = "{}"
content = {{ lookup = "template", text = "hello from {{{{ facts.os }}}}" }}
"#,
            target.to_string_lossy()
        );

        let manifest = Manifest::parse(&toml).unwrap();
        let resources = manifest.resources(&builtin_registry()).unwrap();
        let summary = Runner::with_host_defaults()
            .run(resources, &RunOptions::default())
            .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            format!("hello from {}", std::env::consts::OS)
        );
    }
}
