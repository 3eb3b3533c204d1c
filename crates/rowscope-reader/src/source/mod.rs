//! The row-range oracle the reader is built on.
//!
//! A [`RowSource`] is a synchronous, random-access decoder over
//! `[0, record_count)` rows of a dataset identified by path. Every call is
//! self-contained: there is no cursor shared between calls.

mod csv_file;
mod memory;

pub use self::csv_file::{CsvSource, CsvSourceOptions};
pub use self::memory::{MemorySource, MemoryTable};

use rowscope_model::Row;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `row_count` sentinel requesting every remaining row.
pub const ALL_ROWS: i64 = -1;

/// Errors raised by the decode layer.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Row offset must be non-negative")]
    NegativeOffset,
    #[error("Row limit must be positive or -1 (for all records)")]
    InvalidLimit,
    #[error("Unsupported encoding {0}")]
    UnsupportedEncoding(String),
    #[error("unknown dataset: {0}")]
    UnknownDataset(PathBuf),
    #[error("corrupt record {row}: {reason}")]
    Corrupt { row: u64, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Column description as reported by the decoder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceColumn {
    pub name: String,
    pub label: Option<String>,
    pub length: Option<u32>,
    /// Decoder type name, e.g. `double` or `text`.
    pub data_type: String,
    pub display_format: Option<String>,
}

/// Result of the one-shot schema probe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceSchema {
    /// Number of records; negative when the decoder could not determine it.
    pub record_count: i64,
    pub name: String,
    pub label: String,
    pub columns: Vec<SourceColumn>,
    /// Creation time in seconds since the Unix epoch.
    pub created: Option<i64>,
    /// Last modification time in seconds since the Unix epoch.
    pub modified: Option<i64>,
    pub encoding: Option<String>,
    pub compression: Option<String>,
}

pub trait RowSource {
    /// Probe dataset metadata.
    fn fetch_schema(&self, path: &Path) -> Result<SourceSchema, SourceError>;

    /// Fetch up to `row_count` rows starting at `start_row`, or every remaining
    /// row when `row_count` is [`ALL_ROWS`].
    fn fetch_rows(&self, path: &Path, start_row: i64, row_count: i64)
        -> Result<Vec<Row>, SourceError>;
}

impl<T: RowSource + ?Sized> RowSource for &T {
    fn fetch_schema(&self, path: &Path) -> Result<SourceSchema, SourceError> {
        (**self).fetch_schema(path)
    }

    fn fetch_rows(
        &self,
        path: &Path,
        start_row: i64,
        row_count: i64,
    ) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_rows(path, start_row, row_count)
    }
}

impl<T: RowSource + ?Sized> RowSource for std::sync::Arc<T> {
    fn fetch_schema(&self, path: &Path) -> Result<SourceSchema, SourceError> {
        (**self).fetch_schema(path)
    }

    fn fetch_rows(
        &self,
        path: &Path,
        start_row: i64,
        row_count: i64,
    ) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_rows(path, start_row, row_count)
    }
}

/// Validate raw oracle arguments and turn them into `(start, optional limit)`.
pub(crate) fn check_row_args(
    start_row: i64,
    row_count: i64,
) -> Result<(usize, Option<usize>), SourceError> {
    if start_row < 0 {
        return Err(SourceError::NegativeOffset);
    }
    let limit = match row_count {
        ALL_ROWS => None,
        n if n > 0 => Some(n as usize),
        _ => return Err(SourceError::InvalidLimit),
    };
    Ok((start_row as usize, limit))
}
