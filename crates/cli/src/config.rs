//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix, e.g. `CLOUDMODEL_DEFAULT_TIME_UNIT`
const ENV_PREFIX: &str = "CLOUDMODEL";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time unit used by `normalize` when `--unit` is not given
    #[serde(default = "default_time_unit")]
    pub default_time_unit: String,
    /// Output format used when `--format` is not given
    #[serde(default)]
    pub default_format: Option<String>,
}

fn default_time_unit() -> String {
    "hour".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_time_unit: default_time_unit(),
            default_format: None,
        }
    }
}

impl Config {
    /// Load the config file (if any) with environment overrides on top
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = Self::config_path() {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("cloudmodel").join("config.json"))
    }
}
