//! Bundled static default payloads
//!
//! Defaults ship with each deployment as JSON files under
//! `<defaults_dir>/<version>/<section>.json`. A missing file is normal.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ResolutionOutcome;
use crate::cache::{sanitize_name, CACHE_VERSION};

/// Reads the static-default tier from disk
#[derive(Debug, Clone, Default)]
pub struct StaticDefaults {
    dir: Option<PathBuf>,
    version: String,
}

impl StaticDefaults {
    /// Defaults read from `dir/<version>/`
    pub fn new(dir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            dir: Some(dir.into()),
            version: version.into(),
        }
    }

    /// Defaults read from `dir/v1/`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, CACHE_VERSION)
    }

    /// No defaults directory; every lookup reports missing configuration
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// File that would hold the default for `section`
    pub fn path_for(&self, section: &str) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|dir| dir.join(&self.version).join(format!("{}.json", sanitize_name(section))))
    }

    /// Reads the default for `section`, if one exists and has content
    pub fn read_default(&self, section: &str) -> Option<Value> {
        self.lookup(section).ok()
    }

    /// Like `read_default`, but says why nothing was found
    pub fn lookup(&self, section: &str) -> Result<Value, ResolutionOutcome> {
        let path = self
            .path_for(section)
            .ok_or(ResolutionOutcome::ConfigurationMissing)?;

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(section, path = %path.display(), "No static default file");
                return Err(ResolutionOutcome::Miss);
            }
            Err(e) => {
                warn!(section, path = %path.display(), error = %e, "Static default unreadable");
                return Err(ResolutionOutcome::Miss);
            }
        };

        parse_default(section, &path, &text)
    }
}

fn parse_default(section: &str, path: &Path, text: &str) -> Result<Value, ResolutionOutcome> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if super::has_content(&value) => Ok(value),
        Ok(_) => Err(ResolutionOutcome::Empty),
        Err(e) => {
            warn!(section, path = %path.display(), error = %e, "Static default is not valid JSON");
            Err(ResolutionOutcome::Empty)
        }
    }
}
