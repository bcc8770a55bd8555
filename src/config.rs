use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "readup.toml";

fn default_verbose() -> bool {
    true
}

fn default_rows() -> u16 {
    40
}

fn default_cols() -> u16 {
    80
}

fn default_diff() -> Vec<String> {
    vec!["diff".into(), "-u".into()]
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReadupConfig {
    /// Echo each command and its output while scanning.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default = "default_cols")]
    pub cols: u16,
    /// Diff program followed by its leading arguments. The original and
    /// the scratch path are appended.
    #[serde(default = "default_diff")]
    pub diff: Vec<String>,
}

impl Default for ReadupConfig {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            rows: default_rows(),
            cols: default_cols(),
            diff: default_diff(),
        }
    }
}

impl ReadupConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Could not parse {}", path.display()))
    }

    /// Loads `readup.toml` from the current directory, falling back to the
    /// defaults when it is absent or unusable.
    pub fn load() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.is_file() {
            log::debug!("no {CONFIG_FILE} found, using defaults");
            return Self::default();
        }
        Self::from_path(path).unwrap_or_else(|e| {
            log::warn!("{e:#}, using defaults");
            Self::default()
        })
    }
}
