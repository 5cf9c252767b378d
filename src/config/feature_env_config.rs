//! Feature window configuration parsing from environment variables.

use crate::application::features::engine::FeatureConfig;
use crate::application::features::rolling::RollingWindow;
use anyhow::{Context, Result};

/// Read the rolling window settings, falling back to the engine defaults.
pub fn feature_config_from_lookup<F>(lookup: &F) -> Result<FeatureConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = FeatureConfig::default();

    let config = FeatureConfig {
        volume_zscore: RollingWindow {
            window: parse_usize(lookup, "ZSCORE_WINDOW", defaults.volume_zscore.window)?,
            min_periods: parse_usize(
                lookup,
                "ZSCORE_MIN_PERIODS",
                defaults.volume_zscore.min_periods,
            )?,
        },
        close_sma: RollingWindow {
            window: parse_usize(lookup, "SMA_WINDOW", defaults.close_sma.window)?,
            min_periods: parse_usize(lookup, "SMA_MIN_PERIODS", defaults.close_sma.min_periods)?,
        },
    };

    config.validate().context("Invalid feature window settings")?;
    Ok(config)
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}
