//! Configuration for the connectome server connection

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub output: OutputYamlConfig,
}

/// Connectome server section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub host: String,
    pub dataset: String,
    /// Bearer token. Prefer the NEUPRINT_TOKEN env var over storing it here.
    pub token: String,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            host: "https://neuprint.janelia.org".into(),
            dataset: "hemibrain:v1.2.1".into(),
            token: String::new(),
        }
    }
}

/// Output section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputYamlConfig {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self {
            path: "synapses.svg".into(),
            width: 800,
            height: 600,
        }
    }
}

// ============================================================================
// Runtime config
// ============================================================================

/// Resolved runtime configuration.
///
/// Built from an optional YAML file with environment variable overrides:
/// `NEUPRINT_SERVER`, `NEUPRINT_DATASET`, `NEUPRINT_TOKEN`.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub dataset: String,
    pub token: String,
    pub output_path: String,
    pub figure_width: u32,
    pub figure_height: u32,
}

impl Config {
    /// Load configuration from the environment, merging an optional YAML file.
    ///
    /// Looks for `SYNVIZ_CONFIG` or `./synviz.yaml` when no path is given.
    pub fn from_env(config_path: Option<&Path>) -> Result<Self> {
        let yaml = match Self::resolve_config_path(config_path) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_yaml::from_str::<YamlConfig>(&raw)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => YamlConfig::default(),
        };

        Ok(Self {
            server: std::env::var("NEUPRINT_SERVER").unwrap_or(yaml.server.host),
            dataset: std::env::var("NEUPRINT_DATASET").unwrap_or(yaml.server.dataset),
            token: std::env::var("NEUPRINT_TOKEN").unwrap_or(yaml.server.token),
            output_path: yaml.output.path,
            figure_width: yaml.output.width,
            figure_height: yaml.output.height,
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Option<std::path::PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("SYNVIZ_CONFIG") {
            return Some(path.into());
        }
        let default = Path::new("synviz.yaml");
        default.exists().then(|| default.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_fill_missing_sections() {
        let yaml: YamlConfig = serde_yaml::from_str("server:\n  dataset: manc:v1.0\n").unwrap();
        assert_eq!(yaml.server.dataset, "manc:v1.0");
        assert_eq!(yaml.server.host, "https://neuprint.janelia.org");
        assert_eq!(yaml.output.width, 800);
    }

    #[test]
    fn empty_yaml_is_valid() {
        let yaml: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(yaml.output.path, "synapses.svg");
    }
}
