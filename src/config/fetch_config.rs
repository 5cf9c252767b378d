//! Archive download configuration parsing from environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VISION_URL: &str = "https://data.binance.vision";

/// Archive download settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchEnvConfig {
    pub base_url: String,
    pub verify_checksums: bool,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for FetchEnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VISION_URL.to_string(),
            verify_checksums: false,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl FetchEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            base_url: lookup("BINANCE_VISION_URL").unwrap_or(defaults.base_url),
            verify_checksums: lookup("VERIFY_CHECKSUMS")
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("Failed to parse VERIFY_CHECKSUMS")?
                .unwrap_or(defaults.verify_checksums),
            timeout_secs: lookup("FETCH_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("Failed to parse FETCH_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeout_secs),
            max_retries: lookup("FETCH_MAX_RETRIES")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("Failed to parse FETCH_MAX_RETRIES")?
                .unwrap_or(defaults.max_retries),
        })
    }
}
