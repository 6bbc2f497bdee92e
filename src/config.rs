use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for ci-metrics.
///
/// Lets users keep the CI credentials and the list of pipelines to inspect
/// out of the command line. Command-line arguments override these values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Buildkite connection settings
    #[serde(default)]
    pub buildkite: BuildkiteConfig,

    /// Settings of the build_success collector
    #[serde(default)]
    pub build_success: BuildSuccessConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildkiteConfig {
    /// Buildkite API access token
    pub token: Option<String>,

    /// Buildkite REST API base URL
    #[serde(default = "default_buildkite_base_url")]
    pub base_url: String,

    /// Organization slug owning the pipelines
    pub organization: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSuccessConfig {
    /// Pipelines to inspect, in order
    #[serde(default)]
    pub pipelines: Vec<String>,

    /// Number of most recent builds to inspect per pipeline
    #[serde(default = "default_builds")]
    pub builds: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl Default for BuildkiteConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_buildkite_base_url(),
            organization: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for BuildSuccessConfig {
    fn default() -> Self {
        Self {
            pipelines: Vec::new(),
            builds: default_builds(),
        }
    }
}

fn default_buildkite_base_url() -> String {
    "https://api.buildkite.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_builds() -> usize {
    10
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ci-metrics.toml
    /// 3. ./ci-metrics.json
    /// 4. ./ci-metrics.yaml
    /// 5. ./ci-metrics.yml
    /// 6. `<user config dir>/ci-metrics/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Self::load_from_path(path);
        }

        let candidates = [
            "ci-metrics.toml",
            "ci-metrics.json",
            "ci-metrics.yaml",
            "ci-metrics.yml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .chain(user_config_path());

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        log::debug!("Loading configuration from {}", path.display());

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ci-metrics").join("config.toml"))
}
