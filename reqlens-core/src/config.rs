//! Service configuration
//!
//! Settings come from built-in defaults, an optional YAML file and a small
//! set of environment variables, in that order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default hypothesis used to turn each label into an entailment query
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This requirement is about {}.";

/// Minimum score for a label to be kept
pub const DEFAULT_THRESHOLD: f32 = 0.4;

/// Environment variable naming a config file to load instead of the per-user one
pub const CONFIG_PATH_ENV: &str = "REQLENS_CONFIG";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of threads draining the request queue
    pub workers: usize,
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: 4,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where uploaded documents are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Zero-shot classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// Base URL of the inference API; the model ID is appended
    pub endpoint: String,
    pub model: String,
    pub hypothesis_template: String,
    pub threshold: f32,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://router.huggingface.co/hf-inference/models".to_string(),
            model: "facebook/bart-large-mnli".to_string(),
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            threshold: DEFAULT_THRESHOLD,
            timeout_secs: 60,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Loads configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration to use
    ///
    /// A path given explicitly or through `REQLENS_CONFIG` must exist.
    /// Otherwise the per-user config file is used when present, then the
    /// built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::resolve`], reading the environment through `lookup`
    pub fn resolve_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = explicit.map(Path::to_path_buf).or_else(|| {
            lookup(CONFIG_PATH_ENV)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        });

        let mut config = match required {
            Some(path) => Self::load(&path)?,
            None => match get_config_path() {
                Some(path) if path.exists() => Self::load(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(&lookup)?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("REQLENS_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid REQLENS_PORT: {:?}", port))?;
        }
        if let Some(dir) = lookup("REQLENS_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("REQLENS_CLASSIFIER_URL") {
            self.classifier.endpoint = url;
        }

        self.validate()
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.server.workers == 0 {
            anyhow::bail!("server.workers must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.classifier.threshold) {
            anyhow::bail!(
                "classifier.threshold must be between 0 and 1, got {}",
                self.classifier.threshold
            );
        }
        if !self.classifier.hypothesis_template.contains("{}") {
            anyhow::bail!("classifier.hypothesis_template must contain a {{}} placeholder");
        }
        Ok(())
    }

    /// Serialize the configuration back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration")
    }
}

/// Returns the reqlens configuration directory
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reqlens"))
}

/// Gets the per-user configuration file path
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// API token for the inference endpoint, read only from the environment
pub fn inference_token() -> Option<String> {
    std::env::var("HF_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}
