use crate::error::{ReadError, Result};
use crate::fetch::{FetchCounters, FetchStats, Window, WindowedFetcher};
use crate::options::{DatasetOptions, ReadOptions, StreamOptions, UniqueValuesOptions};
use crate::pager::{AdaptiveFilterPager, PagerRequest};
use crate::projection::Projection;
use crate::schema::{resolve_columns, SchemaCache};
use crate::source::RowSource;
use crate::stream::RecordStream;
use crate::unique::UniqueValueAggregator;
use rowscope_model::{DatasetMetadata, Record, RecordKind, UniqueValues};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Filesystem facts captured when the dataset was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// A dataset at `path`, read through `source`.
///
/// Metadata is probed lazily on the first operation and then shared by every
/// read, stream and aggregation over this handle.
#[derive(Debug)]
pub struct Dataset<S> {
    path: PathBuf,
    source: S,
    schema: SchemaCache,
    stats: FetchStats,
    file: Option<FileInfo>,
}

impl<S: RowSource> Dataset<S> {
    pub fn open(path: impl Into<PathBuf>, source: S, options: DatasetOptions) -> Result<Self> {
        let path = path.into();
        let file = match std::fs::metadata(&path) {
            Ok(meta) => Some(FileInfo {
                size: meta.len(),
                modified: meta.modified().ok(),
            }),
            Err(_) if options.check_exists => return Err(ReadError::FileNotFound(path)),
            Err(_) => None,
        };
        Ok(Self {
            path,
            source,
            schema: SchemaCache::new(),
            stats: FetchStats::default(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `None` when the path did not exist on disk at open time.
    pub fn file_info(&self) -> Option<FileInfo> {
        self.file
    }

    pub fn fetch_stats(&self) -> FetchCounters {
        self.stats.snapshot()
    }

    pub fn metadata(&self) -> Result<Arc<DatasetMetadata>> {
        self.schema.load(&self.source, &self.path)
    }

    fn loaded(&self) -> Result<&DatasetMetadata> {
        self.schema.load(&self.source, &self.path)?;
        self.schema
            .get()
            .map(|m| &**m)
            .ok_or_else(|| ReadError::InvalidSchema {
                path: self.path.clone(),
                reason: "metadata is not loaded".to_owned(),
            })
    }

    fn fetcher<'a>(&'a self, metadata: &'a DatasetMetadata) -> WindowedFetcher<'a, S> {
        WindowedFetcher::new(&self.source, &self.path, metadata, &self.stats)
    }

    /// Read up to `length` rows from `start`, optionally filtered.
    ///
    /// With a filter, rows are scanned until `length` matches are found or the
    /// dataset ends; matches past `length` are dropped.
    pub fn get_data(&self, options: &ReadOptions) -> Result<Vec<Record>> {
        let metadata = self.loaded()?;
        let records = metadata.records;
        if options.length == Some(0) {
            return Err(ReadError::invalid_range("length must be positive"));
        }
        if options.start > records {
            return Err(ReadError::invalid_range(format!(
                "start {} is beyond the last record ({records})",
                options.start
            )));
        }
        let projection = Projection::new(metadata, options.kind, &options.columns)?;
        let fetcher = self.fetcher(metadata);

        let rows = match &options.filter {
            None => {
                let mut rows = fetcher
                    .fetch(options.start, Window::from_length(options.length))?
                    .rows;
                if let Some(length) = options.length {
                    rows.truncate(length);
                }
                rows
            }
            Some(filter) => {
                let request = PagerRequest::new(options.start, options.length)
                    .with_dynamic(options.dynamic_length);
                AdaptiveFilterPager::new(&fetcher)
                    .run(filter.as_ref(), request)?
                    .rows
            }
        };
        Ok(rows.into_iter().map(|row| projection.apply(row)).collect())
    }

    /// Stream records page by page.
    pub fn read_records(&self, options: StreamOptions) -> Result<RecordStream<'_, S>> {
        let metadata = self.loaded()?;
        let projection = Projection::new(metadata, options.kind, &options.columns)?;
        RecordStream::new(
            self.fetcher(metadata),
            projection,
            options.filter,
            options.start,
            options.buffer_length,
            options.dynamic_length,
        )
    }

    /// Distinct values per column, with optional counts.
    ///
    /// Scanning stops as soon as every column holds `limit` values.
    pub fn get_unique_values(&self, options: &UniqueValuesOptions) -> Result<UniqueValues> {
        let metadata = self.loaded()?;
        let mut indices = resolve_columns(metadata, &options.columns)?;
        let mut seen = vec![false; metadata.columns.len()];
        indices.retain(|&idx| !std::mem::replace(&mut seen[idx], true));
        if indices.is_empty() {
            return Ok(UniqueValues::default());
        }

        let names: Vec<String> = indices
            .iter()
            .map(|&idx| metadata.columns[idx].name.clone())
            .collect();
        let mut aggregator =
            UniqueValueAggregator::new(names.clone(), options.limit, options.add_count);
        let stream = self.read_records(
            StreamOptions::new()
                .with_buffer_length(options.buffer_length)
                .with_kind(RecordKind::Array)
                .with_columns(names),
        )?;

        let mut rows = 0u64;
        for record in stream {
            let record = record?;
            if let Some(row) = record.as_array() {
                aggregator.observe(row);
            }
            rows += 1;
            if aggregator.is_saturated() {
                log::debug!(
                    "unique values for {} saturated after {rows} rows",
                    self.path.display()
                );
                break;
            }
        }
        Ok(aggregator.finish(options.sort))
    }
}
