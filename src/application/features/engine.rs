use crate::application::features::rolling::{RollingWindow, rolling_mean, rolling_std};
use crate::domain::candle::CandleTable;
use crate::domain::errors::PipelineError;
use crate::domain::features::{FeatureRecord, FeatureTable};
use crate::domain::ports::ColumnSource;
use crate::domain::value::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Columns the engine reads. All must be present.
pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Window settings for the rolling features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub volume_zscore: RollingWindow,
    pub close_sma: RollingWindow,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            volume_zscore: RollingWindow {
                window: 60,
                min_periods: 20,
            },
            close_sma: RollingWindow {
                window: 30,
                min_periods: 10,
            },
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.volume_zscore.validate()?;
        self.close_sma.validate()
    }
}

/// Derived feature columns, one entry per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub log_return: Vec<Value>,
    pub spread: Vec<Value>,
    pub volume_zscore: Vec<Value>,
    pub hlc3: Vec<Value>,
    pub close_sma_30: Vec<Value>,
}

impl DerivedFeatures {
    pub fn len(&self) -> usize {
        self.log_return.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_return.is_empty()
    }
}

/// Compute features with the default window settings.
pub fn compute_features(table: &CandleTable) -> Result<FeatureTable, PipelineError> {
    FeatureEngine::default().compute(table)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngine {
    config: FeatureConfig,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extend every candle with its derived features. The input table is
    /// left untouched and row order is preserved.
    pub fn compute(&self, table: &CandleTable) -> Result<FeatureTable, PipelineError> {
        let derived = self.derive(table)?;

        let rows = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, candle)| FeatureRecord {
                candle: candle.clone(),
                log_return: derived.log_return[i],
                spread: derived.spread[i],
                volume_zscore: derived.volume_zscore[i],
                hlc3: derived.hlc3[i],
                close_sma_30: derived.close_sma_30[i],
            })
            .collect();

        Ok(FeatureTable::new(rows))
    }

    /// Derive the feature columns from any table exposing the required
    /// numeric columns.
    pub fn derive<T: ColumnSource + ?Sized>(
        &self,
        source: &T,
    ) -> Result<DerivedFeatures, PipelineError> {
        let [_open, high, low, close, volume] = required_columns(source)?;

        // A zero close has no meaningful log or ratio
        let safe_close: Vec<Value> = close.iter().map(|c| c.zero_as_undefined()).collect();

        let log_close: Vec<Value> = safe_close.iter().map(|c| c.ln()).collect();
        let log_return = std::iter::once(Value::Undefined)
            .chain(log_close.windows(2).map(|w| w[1] - w[0]))
            .take(log_close.len())
            .collect();

        let spread = (0..high.len())
            .map(|i| (high[i] - low[i]) / safe_close[i])
            .collect();

        let vol_mean = rolling_mean(&volume, self.config.volume_zscore);
        let vol_std = rolling_std(&volume, self.config.volume_zscore);
        let volume_zscore = (0..volume.len())
            .map(|i| (volume[i] - vol_mean[i]) / vol_std[i])
            .collect();

        let hlc3 = (0..high.len())
            .map(|i| (high[i] + low[i] + close[i]) / 3.0)
            .collect();

        let close_sma_30 = rolling_mean(&close, self.config.close_sma);

        debug!("Derived features for {} rows", close.len());

        Ok(DerivedFeatures {
            log_return,
            spread,
            volume_zscore,
            hlc3,
            close_sma_30,
        })
    }
}

fn required_columns<T: ColumnSource + ?Sized>(
    source: &T,
) -> Result<[Vec<Value>; 5], PipelineError> {
    let mut missing = Vec::new();
    let mut found = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        match source.numeric_column(name) {
            Some(col) if col.len() != source.row_count() => {
                return Err(PipelineError::Schema(format!(
                    "column {} has {} values for {} rows",
                    name,
                    col.len(),
                    source.row_count()
                )));
            }
            Some(col) => found.push(col),
            None => missing.push(name),
        }
    }

    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(PipelineError::missing_columns(&missing));
    }

    found
        .try_into()
        .map_err(|_| PipelineError::Schema("required column lookup mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::CandleRecord;
    use chrono::{TimeZone, Utc};

    fn table_from_closes(closes: &[f64]) -> CandleTable {
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open_time = Utc
                    .timestamp_opt(1_704_067_200 + i as i64 * 60, 0)
                    .unwrap();
                CandleRecord {
                    open_time,
                    open: Value::new(c),
                    high: Value::new(c + 2.0),
                    low: Value::new(c - 1.0),
                    close: Value::new(c),
                    volume: Value::new(10.0 + (i % 7) as f64),
                    close_time: open_time + chrono::Duration::microseconds(59_999_999),
                    quote_asset_volume: Value::Undefined,
                    number_of_trades: Value::Number(1.0),
                    taker_buy_base_asset_volume: Value::Undefined,
                    taker_buy_quote_asset_volume: Value::Undefined,
                    ignore: "0".to_string(),
                }
            })
            .collect();
        CandleTable::from_rows(rows)
    }

    struct Columns(Vec<(&'static str, Vec<Value>)>);

    impl ColumnSource for Columns {
        fn row_count(&self) -> usize {
            self.0.first().map(|(_, c)| c.len()).unwrap_or(0)
        }

        fn numeric_column(&self, name: &str) -> Option<Vec<Value>> {
            self.0.iter().find(|(n, _)| *n == name).map(|(_, c)| c.clone())
        }
    }

    #[test]
    fn test_log_return_handles_zero_close() {
        let table = table_from_closes(&[100.0, 105.0, 0.0, 95.0]);
        let features = compute_features(&table).unwrap();
        let lr: Vec<Value> = features.rows().iter().map(|r| r.log_return).collect();

        assert_eq!(lr[0], Value::Undefined);
        match lr[1] {
            Value::Number(x) => assert!((x - 1.05f64.ln()).abs() < 1e-12),
            Value::Undefined => panic!("expected ln(1.05)"),
        }
        assert_eq!(lr[2], Value::Undefined);
        assert_eq!(lr[3], Value::Undefined);
    }

    #[test]
    fn test_spread_and_hlc3() {
        let table = table_from_closes(&[100.0, 0.0]);
        let features = compute_features(&table).unwrap();
        let first = &features.rows()[0];

        assert_eq!(first.spread, Value::Number(3.0 / 100.0));
        assert_eq!(first.hlc3, Value::Number((102.0 + 99.0 + 100.0) / 3.0));
        assert_eq!(features.rows()[1].spread, Value::Undefined);
        // hlc3 uses the raw close, zero included
        assert_eq!(features.rows()[1].hlc3, Value::Number(1.0 / 3.0));
    }

    #[test]
    fn test_constant_volume_zscore_is_undefined() {
        let columns = Columns(vec![
            ("open", vec![Value::Number(1.0); 25]),
            ("high", vec![Value::Number(1.0); 25]),
            ("low", vec![Value::Number(1.0); 25]),
            ("close", vec![Value::Number(1.0); 25]),
            ("volume", vec![Value::Number(5.0); 25]),
        ]);
        let derived = FeatureEngine::default().derive(&columns).unwrap();
        assert!(derived.volume_zscore.iter().all(Value::is_undefined));
    }

    #[test]
    fn test_missing_columns_are_named() {
        let columns = Columns(vec![
            ("open", vec![]),
            ("high", vec![]),
            ("low", vec![]),
            ("close", vec![]),
        ]);
        let err = FeatureEngine::default().derive(&columns).unwrap_err();
        match err {
            PipelineError::Schema(msg) => {
                assert!(msg.ends_with(": volume"), "{msg}");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table() {
        let features = compute_features(&CandleTable::empty()).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_custom_windows() {
        let config = FeatureConfig {
            volume_zscore: RollingWindow {
                window: 5,
                min_periods: 3,
            },
            close_sma: RollingWindow {
                window: 2,
                min_periods: 2,
            },
        };
        let engine = FeatureEngine::new(config).unwrap();
        let table = table_from_closes(&[1.0, 3.0, 5.0, 7.0]);
        let features = engine.compute(&table).unwrap();

        let sma: Vec<Value> = features.rows().iter().map(|r| r.close_sma_30).collect();
        assert_eq!(
            sma,
            vec![
                Value::Undefined,
                Value::Number(2.0),
                Value::Number(4.0),
                Value::Number(6.0)
            ]
        );
        assert_eq!(features.rows()[1].volume_zscore, Value::Undefined);
        assert!(features.rows()[2].volume_zscore.is_defined());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FeatureConfig {
            close_sma: RollingWindow {
                window: 3,
                min_periods: 4,
            },
            ..FeatureConfig::default()
        };
        assert!(matches!(
            FeatureEngine::new(config),
            Err(PipelineError::Validation(_))
        ));
    }
}
