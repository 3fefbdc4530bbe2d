//! Host fact gathering
//!
//! A small fact source describing the machine steward runs on. Gathered
//! fresh on every snapshot; anything more expensive belongs in a source
//! that manages its own caching.

use dispatch::{FactSource, Facts};
use std::env;

/// Fact source that inspects the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFacts;

impl FactSource for HostFacts {
    fn snapshot(&self) -> Facts {
        let mut facts = Facts::new()
            .with("os", env::consts::OS)
            .with("family", env::consts::FAMILY)
            .with("arch", env::consts::ARCH);

        if let Some(home) = dirs::home_dir() {
            facts = facts.with("home", home.to_string_lossy().to_string());
        }
        if let Ok(user) = env::var("USER") {
            facts = facts.with("user", user);
        }
        if let Ok(hostname) = env::var("HOSTNAME") {
            facts = facts.with("hostname", hostname);
        }

        facts
    }
}
