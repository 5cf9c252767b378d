use crate::domain::candle::{CANONICAL_COLUMNS, CandleRecord, NUMERIC_COLUMNS};
use crate::domain::ports::ColumnSource;
use crate::domain::value::Value;
use serde::{Deserialize, Serialize};

/// Derived columns appended after the canonical schema, in output order.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "log_return",
    "spread",
    "volume_zscore",
    "hlc3",
    "close_sma_30",
];

/// Canonical candle extended with derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub candle: CandleRecord,
    pub log_return: Value,
    pub spread: Value,
    pub volume_zscore: Value,
    pub hlc3: Value,
    pub close_sma_30: Value,
}

impl FeatureRecord {
    pub fn numeric(&self, column: &str) -> Option<Value> {
        match column {
            "log_return" => Some(self.log_return),
            "spread" => Some(self.spread),
            "volume_zscore" => Some(self.volume_zscore),
            "hlc3" => Some(self.hlc3),
            "close_sma_30" => Some(self.close_sma_30),
            other => self.candle.numeric(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRecord>,
}

impl FeatureTable {
    /// Rows are taken as given; the engine already preserves input order.
    pub fn new(rows: Vec<FeatureRecord>) -> Self {
        Self { rows }
    }

    /// Canonical columns followed by feature columns.
    pub fn column_names() -> Vec<&'static str> {
        CANONICAL_COLUMNS
            .iter()
            .chain(FEATURE_COLUMNS.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRecord] {
        &self.rows
    }
}

impl ColumnSource for FeatureTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn numeric_column(&self, name: &str) -> Option<Vec<Value>> {
        if !NUMERIC_COLUMNS.contains(&name) && !FEATURE_COLUMNS.contains(&name) {
            return None;
        }
        self.rows.iter().map(|r| r.numeric(name)).collect()
    }
}
