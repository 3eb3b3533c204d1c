use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical type of a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    String,
    Double,
}

impl DataType {
    /// Map a decoder type name (`double`, `text`, `integer`, ...) onto a logical type.
    ///
    /// Every numeric storage type maps to [`DataType::Double`]; anything else is a string.
    pub fn from_source_type(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "double" | "float" | "integer" | "int8" | "int16" | "int32" | "number" => {
                DataType::Double
            }
            _ => DataType::String,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    #[serde(rename = "itemOID")]
    pub item_oid: String,
    pub name: String,
    pub label: String,
    pub length: u32,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            item_oid: format!("IT.{name}"),
            label: name.clone(),
            name,
            length: 1,
            data_type,
            display_format: None,
        }
    }
}

/// Immutable description of a dataset: record count plus ordered columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub name: String,
    pub label: String,
    pub records: usize,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl DatasetMetadata {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a column name to its position. Matching is case-insensitive and exact.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| names_match(&c.name, name))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Case-insensitive column identity.
pub fn names_match(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> DatasetMetadata {
        DatasetMetadata {
            name: "class".to_owned(),
            label: String::new(),
            records: 0,
            columns: vec![
                ColumnDescriptor::new("Name", DataType::String),
                ColumnDescriptor::new("AGE", DataType::Double),
            ],
            created: None,
            modified: None,
            encoding: None,
            compression: None,
        }
    }

    #[test]
    fn column_lookup_ignores_case() {
        let meta = metadata();
        assert_eq!(meta.column_index("age"), Some(1));
        assert_eq!(meta.column_index("NAME"), Some(0));
        assert_eq!(meta.column_index("nam"), None);
    }

    #[test]
    fn source_types_map_to_logical_types() {
        assert_eq!(DataType::from_source_type("double"), DataType::Double);
        assert_eq!(DataType::from_source_type("INTEGER"), DataType::Double);
        assert_eq!(DataType::from_source_type("text"), DataType::String);
        assert_eq!(DataType::from_source_type("?"), DataType::String);
    }
}
