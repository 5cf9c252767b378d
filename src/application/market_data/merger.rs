use crate::application::market_data::archive_reader::ArchiveReader;
use crate::domain::candle::{CandleRecord, CandleTable};
use crate::domain::errors::PipelineError;
use std::path::Path;
use tracing::{info, warn};

/// What to do with rows sharing an `open_time` after the global sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Preserve every row, overlapping archives included.
    #[default]
    Keep,
    /// Keep the row from the earliest archive in input order.
    KeepFirst,
    /// Keep the row from the latest archive in input order.
    KeepLast,
}

/// Merge archives with the default reader and duplicate handling.
pub fn merge<P: AsRef<Path>>(paths: &[P]) -> Result<CandleTable, PipelineError> {
    Merger::default().merge(paths)
}

/// Loads a batch of archives into one time-ordered table.
///
/// All-or-nothing: the first archive that fails to read aborts the merge and
/// nothing read so far is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merger {
    reader: ArchiveReader,
    duplicates: DuplicatePolicy,
}

impl Merger {
    pub fn new(reader: ArchiveReader) -> Self {
        Self {
            reader,
            duplicates: DuplicatePolicy::Keep,
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn merge<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CandleTable, PipelineError> {
        if paths.is_empty() {
            return Ok(CandleTable::empty());
        }

        let tables = paths
            .iter()
            .map(|p| self.reader.read(p))
            .collect::<Result<Vec<_>, _>>()?;

        let combined = CandleTable::concat(tables);
        let merged = match self.duplicates {
            DuplicatePolicy::Keep => combined,
            policy => dedup(combined, policy),
        };

        let duplicates = count_duplicate_times(merged.rows());
        if duplicates > 0 {
            warn!(
                "Merged table contains {} rows sharing an open_time with a previous row",
                duplicates
            );
        }

        info!(
            "Merged {} archives into {} candles",
            paths.len(),
            merged.len()
        );
        Ok(merged)
    }
}

/// Rows are already stably sorted, so each run of equal timestamps is in
/// archive order.
fn dedup(table: CandleTable, policy: DuplicatePolicy) -> CandleTable {
    let mut rows: Vec<CandleRecord> = Vec::with_capacity(table.len());
    for row in table.into_rows() {
        match rows.last_mut() {
            Some(last) if last.open_time == row.open_time => {
                if policy == DuplicatePolicy::KeepLast {
                    *last = row;
                }
            }
            _ => rows.push(row),
        }
    }
    CandleTable::from_rows(rows)
}

fn count_duplicate_times(rows: &[CandleRecord]) -> usize {
    rows.windows(2)
        .filter(|w| w[0].open_time == w[1].open_time)
        .count()
}
