use pretty_assertions::assert_eq;
use rowscope_model::{
    ColumnDescriptor, ColumnUniqueValues, DataType, DatasetMetadata, Record, RecordObject,
    UniqueValues, Value,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[test]
fn array_records_serialize_as_plain_json_arrays() {
    let record = Record::Array(vec![Value::from("Alfred"), Value::Number(14.0), Value::Null]);
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!(["Alfred", 14.0, null])
    );
}

#[test]
fn object_records_keep_column_order() {
    let mut obj = RecordObject::with_capacity(2);
    obj.push(Arc::from("SEX"), Value::from("M"));
    obj.push(Arc::from("AGE"), Value::Number(14.0));
    let text = serde_json::to_string(&Record::Object(obj)).unwrap();
    assert_eq!(text, r#"{"SEX":"M","AGE":14.0}"#);
}

#[test]
fn values_deserialize_from_untagged_json() {
    let values: Vec<Value> = serde_json::from_value(json!(["x", 1, null])).unwrap();
    assert_eq!(values, vec![Value::from("x"), Value::Number(1.0), Value::Null]);
}

#[test]
fn metadata_uses_dataset_json_field_names() {
    let meta = DatasetMetadata {
        name: "class".to_owned(),
        label: "Student Data".to_owned(),
        records: 19,
        columns: vec![ColumnDescriptor::new("AGE", DataType::Double)],
        created: None,
        modified: None,
        encoding: None,
        compression: None,
    };
    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "class",
            "label": "Student Data",
            "records": 19,
            "columns": [{
                "itemOID": "IT.AGE",
                "name": "AGE",
                "label": "AGE",
                "length": 1,
                "dataType": "double"
            }]
        })
    );
    let back: DatasetMetadata = serde_json::from_value(value).unwrap();
    assert_eq!(back, meta);
}

#[test]
fn unique_values_serialize_as_column_map() {
    let mut counts = BTreeMap::new();
    counts.insert("null".to_owned(), 2);
    let result = UniqueValues::new(vec![(
        "AGE".to_owned(),
        ColumnUniqueValues {
            values: vec![Value::Null],
            counts,
        },
    )]);
    assert!(result.get("age").is_some());
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "AGE": { "values": [null], "counts": { "null": 2 } } })
    );
}
