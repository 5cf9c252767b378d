//! Batch ingestion: merge archives, derive features, persist one Parquet file.

use crate::application::features::engine::FeatureEngine;
use crate::application::market_data::archive_reader::ArchiveReader;
use crate::application::market_data::merger::Merger;
use crate::config::{DataKind, PipelineConfig};
use crate::domain::errors::PipelineError;
use crate::infrastructure::columnar::write_features;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionSummary {
    pub archives: usize,
    pub rows: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub output: PathBuf,
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string());
        writeln!(f, "Archives: {}", self.archives)?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Time range: {} -> {}", time(self.start), time(self.end))?;
        write!(f, "Saved parquet: {}", self.output.display())
    }
}

/// `BTCUSDT-1m-2025-01_03-features.parquet`
pub fn feature_file_name(symbol: &str, year: i32, months: &[u32]) -> Result<String, PipelineError> {
    let (first, last) = match (months.first(), months.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(PipelineError::Validation(
                "at least one month is required".to_string(),
            ));
        }
    };
    Ok(format!(
        "{}-1m-{}-{:02}_{:02}-features.parquet",
        symbol.to_uppercase(),
        year,
        first,
        last
    ))
}

pub struct IngestionPipeline {
    config: PipelineConfig,
    merger: Merger,
    engine: FeatureEngine,
}

impl IngestionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let merger = Merger::new(ArchiveReader::new(config.floor_year));
        let engine = FeatureEngine::new(config.features)?;
        Ok(Self {
            config,
            merger,
            engine,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Default output location under the processed data directory.
    pub fn output_path(&self, file_name: &str) -> Result<PathBuf, PipelineError> {
        Ok(self.config.layout.ensure_dir(DataKind::Processed)?.join(file_name))
    }

    /// Merge the archives, derive features and write them to `output`.
    pub fn run<P: AsRef<Path>>(
        &self,
        archives: &[P],
        output: impl AsRef<Path>,
    ) -> Result<IngestionSummary, PipelineError> {
        let output = output.as_ref();

        let candles = self.merger.merge(archives)?;
        let features = self.engine.compute(&candles)?;
        let rows = write_features(&features, output)?;

        let summary = IngestionSummary {
            archives: archives.len(),
            rows,
            start: candles.first_open_time(),
            end: candles.last_open_time(),
            output: output.to_path_buf(),
        };
        info!(
            "Ingested {} archives, {} rows into {:?}",
            summary.archives, summary.rows, summary.output
        );
        Ok(summary)
    }
}
