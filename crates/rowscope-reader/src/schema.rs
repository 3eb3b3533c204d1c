use crate::error::{ReadError, Result};
use crate::source::{RowSource, SourceSchema};
use chrono::{DateTime, Utc};
use rowscope_model::{ColumnDescriptor, DataType, DatasetMetadata};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Loads dataset metadata once and answers column lookups against it.
#[derive(Debug, Default)]
pub struct SchemaCache {
    metadata: OnceLock<Arc<DatasetMetadata>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the source on first use; later calls return the cached metadata.
    ///
    /// A failed probe is not cached, but it is not retried here either.
    pub fn load<S: RowSource + ?Sized>(
        &self,
        source: &S,
        path: &Path,
    ) -> Result<Arc<DatasetMetadata>> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata.clone());
        }

        let probed = source
            .fetch_schema(path)
            .map_err(|source| ReadError::SchemaProbe {
                path: path.to_path_buf(),
                source,
            })?;
        let metadata = Arc::new(metadata_from_probe(probed, path)?);
        log::debug!(
            "loaded metadata for {}: {} records, {} columns",
            path.display(),
            metadata.records,
            metadata.columns.len()
        );
        Ok(self.metadata.get_or_init(|| metadata).clone())
    }

    pub fn get(&self) -> Option<&Arc<DatasetMetadata>> {
        self.metadata.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.metadata.get().is_some()
    }

    /// Resolve one column name. Returns `None` when unknown or when nothing is loaded yet.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.metadata.get()?.column_index(name)
    }

    /// Resolve a batch of names, reporting every unknown name at once.
    pub fn resolve_all<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<usize>> {
        match self.metadata.get() {
            Some(metadata) => resolve_columns(metadata, names),
            None => Err(ReadError::ColumnsNotFound(
                names.iter().map(|n| n.as_ref().to_owned()).collect(),
            )),
        }
    }
}

/// Resolve column names against `metadata` (case-insensitive, exact).
///
/// Fails with [`ReadError::ColumnsNotFound`] listing every unresolved name.
pub fn resolve_columns<N: AsRef<str>>(
    metadata: &DatasetMetadata,
    names: &[N],
) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match metadata.column_index(name.as_ref()) {
            Some(idx) => indices.push(idx),
            None => missing.push(name.as_ref().to_owned()),
        }
    }
    if !missing.is_empty() {
        return Err(ReadError::ColumnsNotFound(missing));
    }
    Ok(indices)
}

fn metadata_from_probe(probed: SourceSchema, path: &Path) -> Result<DatasetMetadata> {
    let invalid = |reason: &str| ReadError::InvalidSchema {
        path: path.to_path_buf(),
        reason: reason.to_owned(),
    };
    if probed.columns.is_empty() {
        return Err(invalid("there are no columns"));
    }
    let records =
        usize::try_from(probed.record_count).map_err(|_| invalid("record count is unknown"))?;

    let columns = probed
        .columns
        .into_iter()
        .map(|col| {
            let label = col.label.filter(|l| !l.is_empty()).unwrap_or_else(|| col.name.clone());
            ColumnDescriptor {
                item_oid: format!("IT.{}", col.name),
                label,
                length: col.length.filter(|l| *l > 0).unwrap_or(1),
                data_type: DataType::from_source_type(&col.data_type),
                display_format: col.display_format.filter(|f| !f.is_empty()),
                name: col.name,
            }
        })
        .collect();

    let name = if probed.name.is_empty() {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        probed.name
    };

    Ok(DatasetMetadata {
        name,
        label: probed.label,
        records,
        columns,
        created: probed.created.and_then(epoch_seconds),
        modified: probed.modified.and_then(epoch_seconds),
        encoding: probed.encoding,
        compression: probed.compression,
    })
}

fn epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
