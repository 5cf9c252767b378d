use crate::domain::value::Value;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Read-only access to named numeric columns of a table.
///
/// Implemented by the in-memory candle/feature tables and by Arrow record
/// batches loaded from the columnar store, so the feature engine can run on
/// either.
pub trait ColumnSource {
    fn row_count(&self) -> usize;

    /// `None` when the table has no numeric column of that name.
    fn numeric_column(&self, name: &str) -> Option<Vec<Value>>;
}

// Need async_trait for async functions in traits
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Resolve one monthly archive to a local file, downloading it if needed.
    async fn fetch(&self, symbol: &str, year: i32, month: u32) -> Result<PathBuf>;
}
