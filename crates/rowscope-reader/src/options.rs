//! Request options, with every default spelled out once here.

use crate::filter::RowPredicate;
use rowscope_model::RecordKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Rows fetched per page by streaming reads and aggregations.
pub const DEFAULT_BUFFER_LENGTH: usize = 1000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Fail with `FileNotFound` when the path does not exist (default: false).
    pub check_exists: bool,
}

/// Options for a bounded read.
#[derive(Clone, Default)]
pub struct ReadOptions {
    /// First row offset (default: 0).
    pub start: usize,
    /// Maximum rows to return; `None` returns every remaining row (default).
    pub length: Option<usize>,
    /// Output shape (default: [`RecordKind::Array`]).
    pub kind: RecordKind,
    /// Columns to return, matched case-insensitively. Empty means all (default).
    pub columns: Vec<String>,
    /// Keep only rows accepted by this predicate (default: none).
    pub filter: Option<Arc<dyn RowPredicate>>,
    /// With a filter, grow the fetch window from observed selectivity (default: false).
    pub dynamic_length: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_columns<I, N>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: impl RowPredicate + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_dynamic_length(mut self, dynamic: bool) -> Self {
        self.dynamic_length = dynamic;
        self
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("start", &self.start)
            .field("length", &self.length)
            .field("kind", &self.kind)
            .field("columns", &self.columns)
            .field("filter", &self.filter.is_some())
            .field("dynamic_length", &self.dynamic_length)
            .finish()
    }
}

/// Options for a streaming read.
#[derive(Clone)]
pub struct StreamOptions {
    /// First row offset (default: 0).
    pub start: usize,
    /// Rows per page (default: [`DEFAULT_BUFFER_LENGTH`]). With a filter this
    /// is the number of matches per page.
    pub buffer_length: usize,
    pub kind: RecordKind,
    pub columns: Vec<String>,
    pub filter: Option<Arc<dyn RowPredicate>>,
    pub dynamic_length: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            start: 0,
            buffer_length: DEFAULT_BUFFER_LENGTH,
            kind: RecordKind::Array,
            columns: Vec::new(),
            filter: None,
            dynamic_length: false,
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn with_buffer_length(mut self, buffer_length: usize) -> Self {
        self.buffer_length = buffer_length;
        self
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_columns<I, N>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: impl RowPredicate + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_dynamic_length(mut self, dynamic: bool) -> Self {
        self.dynamic_length = dynamic;
        self
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("start", &self.start)
            .field("buffer_length", &self.buffer_length)
            .field("kind", &self.kind)
            .field("columns", &self.columns)
            .field("filter", &self.filter.is_some())
            .field("dynamic_length", &self.dynamic_length)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueValuesOptions {
    /// Columns to aggregate, matched case-insensitively.
    pub columns: Vec<String>,
    /// Maximum distinct values kept per column; 0 means unlimited (default: 0).
    pub limit: usize,
    /// Count occurrences of every value (default: false).
    pub add_count: bool,
    /// Rows per page while scanning (default: [`DEFAULT_BUFFER_LENGTH`]).
    pub buffer_length: usize,
    /// Sort each column's values ascending (default: true).
    pub sort: bool,
}

impl Default for UniqueValuesOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            limit: 0,
            add_count: false,
            buffer_length: DEFAULT_BUFFER_LENGTH,
            sort: true,
        }
    }
}

impl UniqueValuesOptions {
    pub fn new<I, N>(columns: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_add_count(mut self, add_count: bool) -> Self {
        self.add_count = add_count;
        self
    }

    pub fn with_buffer_length(mut self, buffer_length: usize) -> Self {
        self.buffer_length = buffer_length;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}
