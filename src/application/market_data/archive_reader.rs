//! Kline archive reader
//!
//! Extracts the CSV member of a monthly zip archive, assigns the canonical
//! 12-column schema by position, decodes microsecond timestamps and coerces
//! every numeric column into [`Value`].

use crate::domain::candle::{CANONICAL_COLUMNS, CandleRecord, CandleTable};
use crate::domain::errors::PipelineError;
use crate::domain::value::Value;
use chrono::{DateTime, Datelike, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// First year the archive provider published kline data. Anything earlier
/// means the timestamps were decoded with the wrong unit.
pub const DEFAULT_FLOOR_YEAR: i32 = 2017;

const TABULAR_EXTENSION: &str = ".csv";

/// Read one archive with the default floor year.
pub fn read_archive(path: impl AsRef<Path>) -> Result<CandleTable, PipelineError> {
    ArchiveReader::default().read(path)
}

#[derive(Debug, Clone, Copy)]
pub struct ArchiveReader {
    floor_year: i32,
}

impl Default for ArchiveReader {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR_YEAR)
    }
}

impl ArchiveReader {
    pub fn new(floor_year: i32) -> Self {
        Self { floor_year }
    }

    pub fn floor_year(&self) -> i32 {
        self.floor_year
    }

    /// Load a single archive into a time-ordered candle table.
    ///
    /// The archive handle lives only for the duration of this call and is
    /// released on every return path, including parse failures.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<CandleTable, PipelineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| PipelineError::io(path, e))?;

        let member = find_tabular_member(&mut archive, path)?.ok_or_else(|| {
            PipelineError::format(path, "no CSV file found inside archive")
        })?;
        debug!("Reading member {} from {:?}", member, path);

        let entry = archive
            .by_name(&member)
            .map_err(|e| PipelineError::io(path, e))?;
        let rows = parse_klines(entry, path)?;

        self.check_timestamp_unit(&rows, path)?;

        let table = CandleTable::from_rows(rows);
        info!("Loaded {} candles from {:?}", table.len(), path);
        Ok(table)
    }

    fn check_timestamp_unit(&self, rows: &[CandleRecord], path: &Path) -> Result<(), PipelineError> {
        let Some(min_year) = rows.iter().map(|r| r.open_time.year()).min() else {
            return Ok(());
        };

        if min_year < self.floor_year {
            return Err(PipelineError::Schema(format!(
                "timestamp conversion failed for {:?}: earliest open_time year {} is before {}",
                path, min_year, self.floor_year
            )));
        }
        Ok(())
    }
}

/// Name of the first member with a recognized tabular extension.
fn find_tabular_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> Result<Option<String>, PipelineError> {
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| PipelineError::io(path, e))?;
        if entry.is_file() && entry.name().to_ascii_lowercase().ends_with(TABULAR_EXTENSION) {
            return Ok(Some(entry.name().to_string()));
        }
    }
    Ok(None)
}

fn parse_klines<R: Read>(reader: R, path: &Path) -> Result<Vec<CandleRecord>, PipelineError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match csv.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(PipelineError::io(path, e)),
            Err(e) => return Err(PipelineError::format(path, e.to_string())),
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(parse_row(&record, line, path)?);
    }
    Ok(rows)
}

fn parse_row(record: &StringRecord, line: u64, path: &Path) -> Result<CandleRecord, PipelineError> {
    if record.len() != CANONICAL_COLUMNS.len() {
        return Err(PipelineError::format(
            path,
            format!(
                "line {}: expected {} columns, found {}",
                line,
                CANONICAL_COLUMNS.len(),
                record.len()
            ),
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or_default();
    let number = |i: usize| Value::parse(field(i));

    Ok(CandleRecord {
        open_time: parse_micros(field(0), "open_time", line, path)?,
        open: number(1),
        high: number(2),
        low: number(3),
        close: number(4),
        volume: number(5),
        close_time: parse_micros(field(6), "close_time", line, path)?,
        quote_asset_volume: number(7),
        number_of_trades: number(8),
        taker_buy_base_asset_volume: number(9),
        taker_buy_quote_asset_volume: number(10),
        ignore: field(11).to_string(),
    })
}

/// Timestamps are integer microseconds since the Unix epoch.
fn parse_micros(
    raw: &str,
    column: &str,
    line: u64,
    path: &Path,
) -> Result<DateTime<Utc>, PipelineError> {
    let micros: i64 = raw.trim().parse().map_err(|_| {
        PipelineError::format(
            path,
            format!("line {line}: {column} `{raw}` is not an integer timestamp"),
        )
    })?;

    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        PipelineError::format(
            path,
            format!("line {line}: {column} {micros} is out of range"),
        )
    })
}
