use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// A positional row, aligned with the dataset columns.
pub type Row = Vec<Value>;

/// Output shape requested by a reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Positional values.
    #[default]
    Array,
    /// Values keyed by canonical column name.
    Object,
}

/// A row keyed by column name. Field order follows the dataset column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordObject {
    fields: Vec<(Arc<str>, Value)>,
}

impl RecordObject {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: Arc<str>, value: Value) {
        self.fields.push((name, value));
    }

    /// Look up a field by exact name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl Serialize for RecordObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key.as_ref(), value)?;
        }
        map.end()
    }
}

/// One row as returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Array(Row),
    Object(RecordObject),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Array(_) => RecordKind::Array,
            Record::Object(_) => RecordKind::Object,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Record::Array(row) => Some(row),
            Record::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&RecordObject> {
        match self {
            Record::Object(obj) => Some(obj),
            Record::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<Row> {
        match self {
            Record::Array(row) => Some(row),
            Record::Object(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Record::Array(row) => row.len(),
            Record::Object(obj) => obj.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
