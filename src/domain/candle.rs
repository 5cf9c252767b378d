use crate::domain::ports::ColumnSource;
use crate::domain::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kline column order as published by the archive provider.
pub const CANONICAL_COLUMNS: [&str; 12] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
    "quote_asset_volume",
    "number_of_trades",
    "taker_buy_base_asset_volume",
    "taker_buy_quote_asset_volume",
    "ignore",
];

/// Columns coerced to floating point (coercion failures become undefined).
pub const NUMERIC_COLUMNS: [&str; 9] = [
    "open",
    "high",
    "low",
    "close",
    "volume",
    "quote_asset_volume",
    "number_of_trades",
    "taker_buy_base_asset_volume",
    "taker_buy_quote_asset_volume",
];

/// Time column every table is ordered by.
pub const TIME_COLUMN: &str = "open_time";

/// One minute kline in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    pub open_time: DateTime<Utc>,
    pub open: Value,
    pub high: Value,
    pub low: Value,
    pub close: Value,
    pub volume: Value,
    pub close_time: DateTime<Utc>,
    pub quote_asset_volume: Value,
    pub number_of_trades: Value,
    pub taker_buy_base_asset_volume: Value,
    pub taker_buy_quote_asset_volume: Value,
    pub ignore: String,
}

impl CandleRecord {
    pub fn numeric(&self, column: &str) -> Option<Value> {
        let v = match column {
            "open" => self.open,
            "high" => self.high,
            "low" => self.low,
            "close" => self.close,
            "volume" => self.volume,
            "quote_asset_volume" => self.quote_asset_volume,
            "number_of_trades" => self.number_of_trades,
            "taker_buy_base_asset_volume" => self.taker_buy_base_asset_volume,
            "taker_buy_quote_asset_volume" => self.taker_buy_quote_asset_volume,
            _ => return None,
        };
        Some(v)
    }
}

/// Time-ordered collection of canonical candles.
///
/// Tables are never mutated once built; every transformation produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleTable {
    rows: Vec<CandleRecord>,
}

impl CandleTable {
    /// Empty table carrying the canonical schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table ordered by `open_time`. The sort is stable, so rows
    /// sharing a timestamp keep their input order.
    pub fn from_rows(mut rows: Vec<CandleRecord>) -> Self {
        rows.sort_by_key(|r| r.open_time);
        Self { rows }
    }

    /// Concatenate tables in order and re-sort globally.
    pub fn concat(tables: Vec<CandleTable>) -> Self {
        let total = tables.iter().map(CandleTable::len).sum();
        let mut rows = Vec::with_capacity(total);
        for table in tables {
            rows.extend(table.rows);
        }
        Self::from_rows(rows)
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        &CANONICAL_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CandleRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CandleRecord> {
        self.rows
    }

    pub fn open_times(&self) -> Vec<DateTime<Utc>> {
        self.rows.iter().map(|r| r.open_time).collect()
    }

    pub fn first_open_time(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|r| r.open_time)
    }

    pub fn last_open_time(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(|r| r.open_time)
    }
}

impl ColumnSource for CandleTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn numeric_column(&self, name: &str) -> Option<Vec<Value>> {
        if !NUMERIC_COLUMNS.contains(&name) {
            return None;
        }
        self.rows.iter().map(|r| r.numeric(name)).collect()
    }
}
