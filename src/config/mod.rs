//! Configuration module for the kline feature pipeline.
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file) or from a TOML file, and is passed explicitly to the
//! pipeline entry points.

mod feature_env_config;
mod fetch_config;
mod layout;

pub use feature_env_config::feature_config_from_lookup;
pub use fetch_config::{DEFAULT_VISION_URL, FetchEnvConfig};
pub use layout::{DataKind, DataLayout};

use crate::application::features::engine::FeatureConfig;
use crate::application::market_data::archive_reader::DEFAULT_FLOOR_YEAR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: DataLayout,
    /// Earliest plausible `open_time` year for decoded archives
    pub floor_year: i32,
    pub features: FeatureConfig,
    pub fetch: FetchEnvConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: DataLayout::default(),
            floor_year: DEFAULT_FLOOR_YEAR,
            features: FeatureConfig::default(),
            fetch: FetchEnvConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let layout = lookup("DATA_ROOT")
            .map(|root| DataLayout::new(PathBuf::from(root)))
            .unwrap_or_default();

        let floor_year = lookup("FLOOR_YEAR")
            .map(|v| v.parse::<i32>())
            .transpose()
            .context("Failed to parse FLOOR_YEAR")?
            .unwrap_or(DEFAULT_FLOOR_YEAR);

        let features = feature_config_from_lookup(lookup).context("Failed to load feature config")?;
        let fetch = FetchEnvConfig::from_lookup(lookup).context("Failed to load fetch config")?;

        Ok(Self {
            layout,
            floor_year,
            features,
            fetch,
        })
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config
            .features
            .validate()
            .context("Invalid feature window settings")?;
        Ok(config)
    }
}
