use crate::error::{ReadError, Result};
use crate::source::{RowSource, ALL_ROWS};
use rowscope_model::{DatasetMetadata, Row};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of rows requested from the oracle in one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    /// Every row from the start offset to the end of the dataset.
    All,
    Rows(usize),
}

impl Window {
    /// `None` means "all remaining rows".
    pub fn from_length(length: Option<usize>) -> Self {
        length.map_or(Window::All, Window::Rows)
    }

    /// Concrete row count for a read starting at `start`.
    pub fn resolve(self, start: usize, record_count: usize) -> usize {
        let remaining = record_count.saturating_sub(start);
        match self {
            Window::All => remaining,
            Window::Rows(n) => n.min(remaining),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::All => f.write_str("all"),
            Window::Rows(n) => write!(f, "{n}"),
        }
    }
}

/// Rows returned by one oracle call, unmodified.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub start: usize,
    pub requested: Window,
    pub rows: Vec<Row>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cumulative oracle usage.
#[derive(Debug, Default)]
pub struct FetchStats {
    calls: AtomicU64,
    rows: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchCounters {
    /// Number of `fetch_rows` calls that reached the oracle, failed ones included.
    pub calls: u64,
    /// Rows returned by successful calls.
    pub rows: u64,
}

impl FetchStats {
    pub fn snapshot(&self) -> FetchCounters {
        FetchCounters {
            calls: self.calls.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
        }
    }

    fn record(&self, rows: usize) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(rows as u64, Ordering::Relaxed);
    }
}

/// The only component that calls [`RowSource::fetch_rows`].
///
/// Ranges are validated before any I/O; oracle failures surface as
/// [`ReadError::FetchFailed`] and are never retried.
pub struct WindowedFetcher<'a, S: ?Sized> {
    source: &'a S,
    path: &'a Path,
    metadata: &'a DatasetMetadata,
    stats: &'a FetchStats,
}

impl<S: ?Sized> Clone for WindowedFetcher<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for WindowedFetcher<'_, S> {}

impl<'a, S: RowSource + ?Sized> WindowedFetcher<'a, S> {
    pub fn new(
        source: &'a S,
        path: &'a Path,
        metadata: &'a DatasetMetadata,
        stats: &'a FetchStats,
    ) -> Self {
        Self {
            source,
            path,
            metadata,
            stats,
        }
    }

    pub fn record_count(&self) -> usize {
        self.metadata.records
    }

    pub fn metadata(&self) -> &'a DatasetMetadata {
        self.metadata
    }

    pub fn fetch(&self, start: usize, window: Window) -> Result<Page> {
        let records = self.metadata.records;
        if window == Window::Rows(0) {
            return Err(ReadError::invalid_range("window length must be positive"));
        }
        if start > records {
            return Err(ReadError::invalid_range(format!(
                "start {start} is beyond the last record ({records})"
            )));
        }
        if start == records {
            return Ok(Page {
                start,
                requested: window,
                rows: Vec::new(),
            });
        }

        let row_count = match window {
            Window::All => ALL_ROWS,
            Window::Rows(n) => i64::try_from(n).unwrap_or(i64::MAX),
        };
        let offset = i64::try_from(start).unwrap_or(i64::MAX);
        let fetched = self.source.fetch_rows(self.path, offset, row_count);
        self.stats.record(fetched.as_ref().map_or(0, Vec::len));
        let rows = fetched.map_err(|source| ReadError::FetchFailed {
            start,
            window,
            source,
        })?;
        log::debug!(
            "fetched {} rows from {} (start {start}, window {window})",
            rows.len(),
            self.path.display()
        );
        if let Window::Rows(n) = window {
            if rows.len() > n {
                log::warn!(
                    "source returned {} rows for a window of {n} at {start}",
                    rows.len()
                );
            }
        }
        Ok(Page {
            start,
            requested: window,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_resolves_against_remaining_rows() {
        assert_eq!(Window::All.resolve(5, 20), 15);
        assert_eq!(Window::Rows(10).resolve(15, 20), 5);
        assert_eq!(Window::Rows(3).resolve(0, 20), 3);
        assert_eq!(Window::Rows(3).resolve(25, 20), 0);
    }

    #[test]
    fn window_display() {
        assert_eq!(Window::All.to_string(), "all");
        assert_eq!(Window::from_length(Some(7)).to_string(), "7");
    }
}
