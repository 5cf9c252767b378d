//! Parquet writer for candle and feature tables.
//!
//! Timestamps are stored as `Timestamp(Microsecond, "UTC")`, undefined
//! values as nulls.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::info;

use crate::domain::candle::{CANONICAL_COLUMNS, CandleRecord, CandleTable, NUMERIC_COLUMNS};
use crate::domain::errors::PipelineError;
use crate::domain::features::{FEATURE_COLUMNS, FeatureTable};
use crate::domain::value::Value;

const TIMEZONE: &str = "UTC";

/// Write a feature table to a single Parquet file. Returns rows written.
pub fn write_features(table: &FeatureTable, path: impl AsRef<Path>) -> Result<usize, PipelineError> {
    let candles: Vec<&CandleRecord> = table.rows().iter().map(|r| &r.candle).collect();
    let mut fields = candle_fields();
    let mut columns = candle_arrays(&candles);

    for name in FEATURE_COLUMNS {
        fields.push(Field::new(name, DataType::Float64, true));
        columns.push(float_array(
            table.rows().iter().map(|r| r.numeric(name).unwrap_or_default()),
        ));
    }

    write_batch(path.as_ref(), fields, columns)
}

/// Write a canonical candle table to a single Parquet file. Returns rows written.
pub fn write_candles(table: &CandleTable, path: impl AsRef<Path>) -> Result<usize, PipelineError> {
    let candles: Vec<&CandleRecord> = table.rows().iter().collect();
    write_batch(path.as_ref(), candle_fields(), candle_arrays(&candles))
}

fn write_batch(path: &Path, fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<usize, PipelineError> {
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| PipelineError::Schema(e.to_string()))?;

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| PipelineError::io(path, e))?;
    writer.write(&batch).map_err(|e| PipelineError::io(path, e))?;
    writer.close().map_err(|e| PipelineError::io(path, e))?;

    info!("Wrote {} rows to {:?}", batch.num_rows(), path);
    Ok(batch.num_rows())
}

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(TIMEZONE.into()))
}

fn candle_fields() -> Vec<Field> {
    CANONICAL_COLUMNS
        .iter()
        .map(|&name| match name {
            "open_time" | "close_time" => Field::new(name, timestamp_type(), false),
            "ignore" => Field::new(name, DataType::Utf8, false),
            _ => Field::new(name, DataType::Float64, true),
        })
        .collect()
}

fn candle_arrays(rows: &[&CandleRecord]) -> Vec<ArrayRef> {
    CANONICAL_COLUMNS
        .iter()
        .map(|&name| match name {
            "open_time" => timestamp_array(rows.iter().map(|r| r.open_time.timestamp_micros())),
            "close_time" => timestamp_array(rows.iter().map(|r| r.close_time.timestamp_micros())),
            "ignore" => Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.ignore.as_str()),
            )) as ArrayRef,
            numeric => {
                debug_assert!(NUMERIC_COLUMNS.contains(&numeric));
                float_array(rows.iter().map(|r| r.numeric(numeric).unwrap_or_default()))
            }
        })
        .collect()
}

fn timestamp_array(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from_iter_values(values).with_timezone(TIMEZONE))
}

fn float_array(values: impl Iterator<Item = Value>) -> ArrayRef {
    Arc::new(values.map(Value::to_option).collect::<Float64Array>())
}
