use crate::drift::KeyFilter;
use crate::traits::FileSystem;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".driftscan.yaml";

/// Analyzer configuration loaded from YAML
///
/// ```yaml
/// # Replace the default ignored keys entirely
/// ignored_keys: [arn, id, etag]
/// # Or keep the defaults and add more
/// extra_ignored_keys: [last_seen, region]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub ignored_keys: Option<Vec<String>>,

    #[serde(default)]
    pub extra_ignored_keys: Vec<String>,
}

impl AnalyzerConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `./.driftscan.yaml` and then
    /// `~/.driftscan/config.yaml` are tried, falling back to defaults.
    pub fn load(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !fs.exists(path) {
                bail!("Config file not found: {}", path.display());
            }
            return Ok((Self::from_file(fs, path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::default_locations() {
            if fs.is_file(&candidate) {
                let config = Self::from_file(fs, &candidate)?;
                return Ok((config, Some(candidate)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Parse a config file
    pub fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs.read_to_string(path)?;

        // An empty file parses as YAML null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Build the key filter this configuration describes
    pub fn key_filter(&self) -> KeyFilter {
        let base = match &self.ignored_keys {
            Some(keys) => KeyFilter::new(keys.iter().cloned()),
            None => KeyFilter::default(),
        };
        base.with_extra(self.extra_ignored_keys.iter().cloned())
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".driftscan").join("config.yaml"));
        }
        locations
    }
}
