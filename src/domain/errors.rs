use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the ingestion and feature pipeline.
///
/// Every variant aborts the single operation that raised it. Nothing in the
/// core recovers from these or falls back to partial output.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Format error in {path:?}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl PipelineError {
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Io {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Schema error for a set of required columns that are absent.
    pub fn missing_columns(missing: &[&str]) -> Self {
        PipelineError::Schema(format!(
            "table is missing required columns: {}",
            missing.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_formatting() {
        let err = PipelineError::missing_columns(&["close", "volume"]);
        let msg = err.to_string();
        assert!(msg.starts_with("Schema error"));
        assert!(msg.contains("close, volume"));
    }

    #[test]
    fn test_format_error_names_path() {
        let err = PipelineError::format("/tmp/BTCUSDT-1m-2024-01.zip", "no CSV member");
        let msg = err.to_string();
        assert!(msg.contains("BTCUSDT-1m-2024-01.zip"));
        assert!(msg.contains("no CSV member"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PipelineError::io("/missing.zip", inner);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("gone"));
    }
}
