//! Trailing-window statistics over undefined-aware series.
//!
//! Windows are positional: window `i` covers rows `i + 1 - window ..= i`
//! regardless of how far apart their timestamps are. Undefined cells are
//! skipped, and a statistic is only produced once the window holds at least
//! `min_periods` defined observations.

use crate::domain::errors::PipelineError;
use crate::domain::value::Value;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindow {
    pub window: usize,
    pub min_periods: usize,
}

impl RollingWindow {
    pub fn new(window: usize, min_periods: usize) -> Result<Self, PipelineError> {
        let params = Self {
            window,
            min_periods,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_periods == 0 {
            return Err(PipelineError::Validation(
                "rolling min_periods must be at least 1".to_string(),
            ));
        }
        if self.min_periods > self.window {
            return Err(PipelineError::Validation(format!(
                "rolling min_periods {} exceeds window {}",
                self.min_periods, self.window
            )));
        }
        Ok(())
    }
}

/// Trailing arithmetic mean.
pub fn rolling_mean(values: &[Value], params: RollingWindow) -> Vec<Value> {
    rolling(values, params, |obs| obs.iter().mean())
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[Value], params: RollingWindow) -> Vec<Value> {
    rolling(values, params, |obs| obs.iter().std_dev())
}

fn rolling(values: &[Value], params: RollingWindow, stat: impl Fn(&[f64]) -> f64) -> Vec<Value> {
    let mut observations = Vec::with_capacity(params.window);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(params.window);
            observations.clear();
            observations.extend(values[start..=i].iter().filter_map(|v| v.to_option()));

            if observations.len() < params.min_periods {
                Value::Undefined
            } else {
                Value::new(stat(&observations))
            }
        })
        .collect()
}
