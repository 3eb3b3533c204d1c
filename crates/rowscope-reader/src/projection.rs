use crate::error::Result;
use crate::schema::resolve_columns;
use rowscope_model::{DatasetMetadata, Record, RecordKind, RecordObject, Row, Value};
use std::sync::Arc;

/// Turns full positional rows into the requested output shape.
///
/// Arrays keep the requested columns in request order. Objects keep dataset
/// column order, keyed by canonical names.
#[derive(Clone, Debug)]
pub(crate) struct Projection {
    kind: RecordKind,
    indices: Option<Vec<usize>>,
    include: Vec<bool>,
    names: Arc<[Arc<str>]>,
}

impl Projection {
    pub(crate) fn new<N: AsRef<str>>(
        metadata: &DatasetMetadata,
        kind: RecordKind,
        columns: &[N],
    ) -> Result<Self> {
        let indices = if columns.is_empty() {
            None
        } else {
            Some(resolve_columns(metadata, columns)?)
        };
        let include = match &indices {
            None => vec![true; metadata.columns.len()],
            Some(indices) => {
                let mut include = vec![false; metadata.columns.len()];
                for &idx in indices {
                    include[idx] = true;
                }
                include
            }
        };
        let names = metadata
            .columns
            .iter()
            .map(|c| Arc::<str>::from(c.name.as_str()))
            .collect();
        Ok(Self {
            kind,
            indices,
            include,
            names,
        })
    }

    pub(crate) fn apply(&self, row: Row) -> Record {
        match self.kind {
            RecordKind::Array => match &self.indices {
                None => Record::Array(row),
                Some(indices) => Record::Array(
                    indices
                        .iter()
                        .map(|&idx| row.get(idx).cloned().unwrap_or(Value::Null))
                        .collect(),
                ),
            },
            RecordKind::Object => {
                let mut obj = RecordObject::with_capacity(self.names.len());
                for (idx, value) in row.into_iter().enumerate() {
                    if self.include.get(idx).copied().unwrap_or(false) {
                        obj.push(self.names[idx].clone(), value);
                    }
                }
                Record::Object(obj)
            }
        }
    }
}
