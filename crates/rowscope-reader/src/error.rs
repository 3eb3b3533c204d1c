use crate::fetch::Window;
use crate::source::SourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ReadError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaUnavailable,
    ColumnsNotFound,
    InvalidRange,
    InvalidFilter,
    FetchFailed,
    FileNotFound,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("could not read file {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to read metadata of {}: {source}", path.display())]
    SchemaProbe {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
    #[error("metadata of {} is unusable: {reason}", path.display())]
    InvalidSchema { path: PathBuf, reason: String },
    #[error("columns {} not found", .0.join(", "))]
    ColumnsNotFound(Vec<String>),
    #[error("invalid start/length parameter values: {reason}")]
    InvalidRange { reason: String },
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("failed to read rows {start}..+{window}: {source}")]
    FetchFailed {
        start: usize,
        window: Window,
        #[source]
        source: SourceError,
    },
}

impl ReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::FileNotFound(_) => ErrorKind::FileNotFound,
            ReadError::SchemaProbe { .. } | ReadError::InvalidSchema { .. } => {
                ErrorKind::SchemaUnavailable
            }
            ReadError::ColumnsNotFound(_) => ErrorKind::ColumnsNotFound,
            ReadError::InvalidRange { .. } => ErrorKind::InvalidRange,
            ReadError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            ReadError::FetchFailed { .. } => ErrorKind::FetchFailed,
        }
    }

    pub(crate) fn invalid_range(reason: impl Into<String>) -> Self {
        ReadError::InvalidRange {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadError>;
