//! Windowed, filtered and aggregated reads over row-oriented datasets.
//!
//! The crate turns a row-range fetch primitive ([`RowSource`]) into:
//! - bounded, validated reads ([`WindowedFetcher`], [`Dataset::get_data`]),
//! - filtered reads whose fetch window adapts to filter selectivity ([`AdaptiveFilterPager`]),
//! - a lazy record stream spanning pages ([`RecordStream`]),
//! - per-column distinct values with early stop ([`Dataset::get_unique_values`]).

#![forbid(unsafe_code)]

mod dataset;
mod error;
mod fetch;
mod filter;
mod options;
mod pager;
mod projection;
mod schema;
pub mod source;
mod stream;
mod unique;

pub use crate::dataset::{Dataset, FileInfo};
pub use crate::error::{ErrorKind, ReadError, Result};
pub use crate::fetch::{FetchCounters, FetchStats, Page, Window, WindowedFetcher};
pub use crate::filter::{CmpOp, Connector, Filter, FilterExpr, RowPredicate, TextOp};
pub use crate::options::{
    DatasetOptions, ReadOptions, StreamOptions, UniqueValuesOptions, DEFAULT_BUFFER_LENGTH,
};
pub use crate::pager::{
    next_window, AdaptiveFilterPager, FilteredPage, PagerRequest, WindowState, MAX_GROWTH,
    MAX_TARGET_MULTIPLE, MIN_SELECTIVITY,
};
pub use crate::schema::{resolve_columns, SchemaCache};
pub use crate::source::{RowSource, SourceError};
pub use crate::stream::RecordStream;
pub use crate::unique::UniqueValueAggregator;

pub use rowscope_model::{
    ColumnDescriptor, ColumnUniqueValues, DataType, DatasetMetadata, Record, RecordKind,
    RecordObject, Row, UniqueValues, Value,
};
