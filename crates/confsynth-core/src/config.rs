//! Synthesis settings
//!
//! Settings can be given in code or loaded from `confsynth.toml` in the
//! output directory:
//!
//! ```toml
//! max_resolve_depth = 12
//! jobs = 4
//! dry_run = false
//! ```

use serde::{Deserialize, Serialize};

use confsynth_content::DEFAULT_MAX_DEPTH;
use confsynth_fs::{ConfigStore, NormalizedPath};

use crate::error::Result;

/// File name looked up by [`SynthConfig::discover`].
pub const CONFIG_FILE: &str = "confsynth.toml";

fn default_max_resolve_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Settings for one synthesis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Bound on nested deferred evaluations.
    #[serde(default = "default_max_resolve_depth")]
    pub max_resolve_depth: usize,

    /// Worker threads for the file phase; `None` means one per CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Compute contents and change flags without touching the filesystem.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: DEFAULT_MAX_DEPTH,
            jobs: None,
            dry_run: false,
        }
    }
}

impl SynthConfig {
    /// Load settings from a TOML, JSON or YAML file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Load `<outdir>/confsynth.toml` if present, defaults otherwise.
    pub fn discover(outdir: &NormalizedPath) -> Result<Self> {
        let path = outdir.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path, "loading synthesis settings");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_max_resolve_depth(mut self, depth: usize) -> Self {
        self.max_resolve_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = SynthConfig::default();
        assert_eq!(config.max_resolve_depth, 10);
        assert_eq!(config.jobs, None);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_discover_missing_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = SynthConfig::discover(&NormalizedPath::new(temp.path())).unwrap();
        assert_eq!(config, SynthConfig::default());
    }

    #[test]
    fn test_discover_reads_partial_toml() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "jobs = 2\n").unwrap();

        let config = SynthConfig::discover(&NormalizedPath::new(temp.path())).unwrap();
        assert_eq!(config.jobs, Some(2));
        assert_eq!(config.max_resolve_depth, 10);
    }

    #[test]
    fn test_load_json() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"dry_run": true, "max_resolve_depth": 4}"#).unwrap();

        let config = SynthConfig::load(&NormalizedPath::new(&path)).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.max_resolve_depth, 4);
    }
}
