use crate::metadata::names_match;
use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Distinct values seen for one column, with optional occurrence counts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ColumnUniqueValues {
    pub values: Vec<Value>,
    /// Occurrences keyed by [`Value::count_key`]. Empty unless counting was requested.
    pub counts: BTreeMap<String, u64>,
}

/// Unique-value results keyed by canonical column name, in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniqueValues {
    columns: Vec<(String, ColumnUniqueValues)>,
}

impl UniqueValues {
    pub fn new(columns: Vec<(String, ColumnUniqueValues)>) -> Self {
        Self { columns }
    }

    /// Look up a column (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&ColumnUniqueValues> {
        self.columns
            .iter()
            .find(|(column, _)| names_match(column, name))
            .map(|(_, values)| values)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnUniqueValues)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> Vec<(String, ColumnUniqueValues)> {
        self.columns
    }
}

impl Serialize for UniqueValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in &self.columns {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}
