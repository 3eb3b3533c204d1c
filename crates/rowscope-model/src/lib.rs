//! Data model shared by the rowscope reader and its front ends.
//!
//! - [`Value`]: the scalar cell type (`string | number | null`).
//! - [`DatasetMetadata`] / [`ColumnDescriptor`]: immutable schema of a dataset.
//! - [`Record`]: one output row, either positional or keyed by column name.
//! - [`UniqueValues`]: per-column distinct values and occurrence counts.

#![forbid(unsafe_code)]

mod metadata;
mod record;
mod unique;
mod value;

pub use crate::metadata::{names_match, ColumnDescriptor, DataType, DatasetMetadata};
pub use crate::record::{Record, RecordKind, RecordObject, Row};
pub use crate::unique::{ColumnUniqueValues, UniqueValues};
pub use crate::value::{Value, ValueKey};
