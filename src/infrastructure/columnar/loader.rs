use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, UInt32Array};
use arrow::compute::{cast, concat_batches, take_record_batch};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use crate::domain::candle::TIME_COLUMN;
use crate::domain::errors::PipelineError;
use crate::domain::ports::ColumnSource;
use crate::domain::value::Value;

/// Load and concatenate persisted tables.
///
/// All files must share one schema. When an `open_time` column is present
/// the result is stably re-sorted by it. No files yields an empty batch with
/// an empty schema, since there was nothing to infer one from.
pub fn load_many<P: AsRef<Path>>(paths: &[P]) -> Result<RecordBatch, PipelineError> {
    let mut schema: Option<Arc<Schema>> = None;
    let mut batches = Vec::new();

    for path in paths {
        let (file_schema, file_batches) = read_file(path.as_ref())?;
        match &schema {
            Some(expected) if expected.fields() != file_schema.fields() => {
                return Err(PipelineError::Schema(format!(
                    "{:?} does not match the schema of the first file",
                    path.as_ref()
                )));
            }
            Some(_) => {}
            None => schema = Some(file_schema),
        }
        batches.extend(file_batches);
    }

    let Some(schema) = schema else {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    };

    let combined =
        concat_batches(&schema, &batches).map_err(|e| PipelineError::Schema(e.to_string()))?;

    let result = match combined.column_by_name(TIME_COLUMN) {
        Some(_) => sort_by_time(&combined)?,
        None => combined,
    };

    info!("Loaded {} rows from {} files", result.num_rows(), paths.len());
    Ok(result)
}

fn read_file(path: &Path) -> Result<(Arc<Schema>, Vec<RecordBatch>), PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| PipelineError::io(path, e))?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(|e| PipelineError::io(path, e))?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::io(path, e))?;
    debug!("Read {} batches from {:?}", batches.len(), path);
    Ok((schema, batches))
}

/// Stable sort by the time column; nulls go last.
fn sort_by_time(batch: &RecordBatch) -> Result<RecordBatch, PipelineError> {
    let column = batch
        .column_by_name(TIME_COLUMN)
        .ok_or_else(|| PipelineError::Schema(format!("missing {TIME_COLUMN} column")))?;

    let as_int = match column.data_type() {
        DataType::Timestamp(_, _) | DataType::Int64 | DataType::Int32 | DataType::UInt32 => {
            cast(column, &DataType::Int64).map_err(|e| PipelineError::Schema(e.to_string()))?
        }
        other => {
            return Err(PipelineError::Schema(format!(
                "{TIME_COLUMN} has unsortable type {other}"
            )));
        }
    };
    let times = as_int
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| PipelineError::Schema(format!("{TIME_COLUMN} is not Int64")))?;

    let mut indices: Vec<u32> = (0..batch.num_rows() as u32).collect();
    indices.sort_by_key(|&i| {
        let i = i as usize;
        if times.is_null(i) {
            (1, 0)
        } else {
            (0, times.value(i))
        }
    });

    take_record_batch(batch, &UInt32Array::from(indices))
        .map_err(|e| PipelineError::Schema(e.to_string()))
}

/// Numeric columns of a loaded table, cast to float.
impl ColumnSource for RecordBatch {
    fn row_count(&self) -> usize {
        self.num_rows()
    }

    fn numeric_column(&self, name: &str) -> Option<Vec<Value>> {
        let column = self.column_by_name(name)?;
        if !column.data_type().is_numeric() {
            return None;
        }
        let floats = cast(column, &DataType::Float64).ok()?;
        let floats = floats.as_any().downcast_ref::<Float64Array>()?;
        Some(
            floats
                .iter()
                .map(|v| v.map(Value::new).unwrap_or(Value::Undefined))
                .collect(),
        )
    }
}
