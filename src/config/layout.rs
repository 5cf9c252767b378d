//! On-disk data layout.
//!
//! Replaces process-wide path helpers: the root directory is a value handed
//! to whoever needs it.

use crate::domain::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of data directory under the layout root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Raw,
    Processed,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Raw => "raw",
            DataKind::Processed => "processed",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(DataKind::Raw),
            "processed" => Ok(DataKind::Processed),
            _ => Err(PipelineError::Validation(format!(
                "kind must be either 'raw' or 'processed', got '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    pub root: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir(&self, kind: DataKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    /// Directory for a kind given by name; unknown names are rejected.
    pub fn path(&self, kind: &str) -> Result<PathBuf, PipelineError> {
        Ok(self.dir(kind.parse()?))
    }

    /// Like [`DataLayout::dir`], creating the directory if it does not exist.
    pub fn ensure_dir(&self, kind: DataKind) -> Result<PathBuf, PipelineError> {
        let dir = self.dir(kind);
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_kinds() {
        let layout = DataLayout::new("/srv/klines");
        assert_eq!(layout.path("raw").unwrap(), PathBuf::from("/srv/klines/raw"));
        assert_eq!(
            layout.path("processed").unwrap(),
            PathBuf::from("/srv/klines/processed")
        );
    }

    #[test]
    fn test_unknown_kind_is_validation_error() {
        let layout = DataLayout::default();
        assert!(matches!(
            layout.path("scratch"),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_ensure_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(tmp.path());

        let dir = layout.ensure_dir(DataKind::Processed).unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("processed"));
    }
}
