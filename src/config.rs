//! Configuration system
//!
//! Provides layered configuration with:
//! - Runtime defaults
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Validation
//!
//! Command line flags are applied on top by the binary. The reconciler itself
//! never reads configuration; it receives [`Filters`] and a [`Classifier`].

use crate::classify::{default_rules, Classifier, RuleSpec};
use crate::models::Filters;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Inclusion filters
    pub filters: FilterConfig,

    /// Export collection
    pub collect: CollectConfig,

    /// Output locations and layout
    pub output: OutputConfig,

    /// Job type rules
    pub classification: ClassificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Empty string disables the comment filter.
    pub required_substring: String,
    pub min_memory: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub sacct_program: String,
    pub window_days: u32,
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub extended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub rules: Vec<RuleSpec>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            required_substring: "fre/".to_string(),
            min_memory: 0,
        }
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            sacct_program: "sacct".to_string(),
            window_days: 7,
            cache_path: PathBuf::from("data_temp"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data_output.json"),
            extended: false,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("sacct-reconcile.toml"),
            PathBuf::from(".sacct-reconcile.toml"),
            dirs::config_dir()
                .map(|d| d.join("sacct-reconcile").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("SACCT_RECONCILE_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        if let Ok(val) = env::var("SACCT_RECONCILE_REQUIRED_SUBSTRING") {
            self.filters.required_substring = val;
        }
        if let Ok(val) = env::var("SACCT_RECONCILE_MIN_MEMORY") {
            self.filters.min_memory = val
                .parse()
                .context("Invalid SACCT_RECONCILE_MIN_MEMORY")?;
        }

        if let Ok(val) = env::var("SACCT_RECONCILE_WINDOW_DAYS") {
            self.collect.window_days = val
                .parse()
                .context("Invalid SACCT_RECONCILE_WINDOW_DAYS")?;
        }
        if let Ok(val) = env::var("SACCT_RECONCILE_CACHE") {
            self.collect.cache_path = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.collect.window_days == 0 {
            return Err(anyhow::anyhow!("Window days must be greater than 0"));
        }
        if self.collect.window_days > 31 {
            warn!(
                window_days = self.collect.window_days,
                "Wide sacct windows may be truncated by the accounting database"
            );
        }

        if !matches!(self.logging.output.as_str(), "console" | "file" | "both") {
            return Err(anyhow::anyhow!(
                "Log output must be console, file or both, got '{}'",
                self.logging.output
            ));
        }

        self.classifier()?;

        Ok(())
    }

    /// Filters for the reconciler
    pub fn filters(&self) -> Filters {
        let mut filters = Filters::new().with_min_memory(self.filters.min_memory);
        if !self.filters.required_substring.is_empty() {
            filters = filters.with_required_substring(self.filters.required_substring.clone());
        }
        filters
    }

    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::from_specs(&self.classification.rules)
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
