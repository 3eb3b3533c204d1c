use super::{check_row_args, RowSource, SourceColumn, SourceError, SourceSchema};
use rowscope_model::Row;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A dataset held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    pub schema: SourceSchema,
    pub rows: Vec<Row>,
    /// Reads touching this row (or any later one) fail as corrupt.
    pub corrupt_from: Option<usize>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, columns: Vec<SourceColumn>, rows: Vec<Row>) -> Self {
        Self {
            schema: SourceSchema {
                record_count: rows.len() as i64,
                name: name.into(),
                columns,
                ..SourceSchema::default()
            },
            rows,
            corrupt_from: None,
        }
    }

    pub fn with_corrupt_from(mut self, row: usize) -> Self {
        self.corrupt_from = Some(row);
        self
    }
}

/// [`RowSource`] over in-memory tables keyed by path.
///
/// Every `fetch_rows` call is recorded so callers can inspect how the
/// dataset was paged.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: BTreeMap<PathBuf, MemoryTable>,
    requests: Mutex<Vec<(i64, i64)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, path: impl Into<PathBuf>, table: MemoryTable) -> Self {
        self.insert(path, table);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, table: MemoryTable) {
        self.tables.insert(path.into(), table);
    }

    /// `(start_row, row_count)` of every row fetch so far, in call order.
    pub fn requests(&self) -> Vec<(i64, i64)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn table(&self, path: &Path) -> Result<&MemoryTable, SourceError> {
        self.tables
            .get(path)
            .ok_or_else(|| SourceError::UnknownDataset(path.to_path_buf()))
    }
}

impl RowSource for MemorySource {
    fn fetch_schema(&self, path: &Path) -> Result<SourceSchema, SourceError> {
        Ok(self.table(path)?.schema.clone())
    }

    fn fetch_rows(
        &self,
        path: &Path,
        start_row: i64,
        row_count: i64,
    ) -> Result<Vec<Row>, SourceError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((start_row, row_count));

        let (start, limit) = check_row_args(start_row, row_count)?;
        let table = self.table(path)?;
        let begin = start.min(table.rows.len());
        let end = match limit {
            Some(limit) => begin.saturating_add(limit).min(table.rows.len()),
            None => table.rows.len(),
        };
        if let Some(bad) = table.corrupt_from {
            if end > bad {
                return Err(SourceError::Corrupt {
                    row: bad as u64,
                    reason: "record checksum mismatch".to_owned(),
                });
            }
        }
        Ok(table.rows[begin..end].to_vec())
    }
}
