//! Configuration for graph building and scanning.
//!
//! Load order: `moddeps.toml` → environment variables → defaults.

use crate::dgml::DEFAULT_FILE_NAME;
use crate::export::ExportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "moddeps.toml";

/// Top-level moddeps configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModdepsConfig {
    pub graph: GraphConfig,
    pub scan: ScanConfig,
}

/// Graph output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Draw content packs inside their owner mod instead of as a
    /// dependency link to it.
    pub group_content_packs: bool,
    /// Output file path, relative to the working directory.
    pub output: PathBuf,
    /// Output format: dgml, dot, mermaid, json.
    pub format: String,
}

/// Scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Folder-name globs treated as ignored (e.g. `"_backup*"`).
    pub exclude: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            group_content_packs: true,
            output: PathBuf::from(DEFAULT_FILE_NAME),
            format: "dgml".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl GraphConfig {
    pub fn export_format(&self) -> Result<ExportFormat> {
        self.format
            .parse::<ExportFormat>()
            .map_err(|e| anyhow::anyhow!(e))
    }
}

impl ModdepsConfig {
    /// Load config from `moddeps.toml` in `dir`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_file(&dir.join(CONFIG_FILE))
    }

    /// Load config from an explicit file path, with env var overrides.
    /// A missing file yields defaults.
    pub fn load_file(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read config {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config {}", config_path.display()))?
        } else {
            Self::default()
        };

        // Environment variable overrides
        env_override(
            "MODDEPS_GROUP_CONTENT_PACKS",
            &mut config.graph.group_content_packs,
        );
        env_override("MODDEPS_OUTPUT", &mut config.graph.output);
        env_override("MODDEPS_FORMAT", &mut config.graph.format);

        // Validate format
        config.graph.export_format()?;

        Ok(config)
    }
}
