mod common;

use common::{ages_dataset, class_dataset, num, text};
use pretty_assertions::assert_eq;
use rowscope_reader::{
    CmpOp, ErrorKind, Filter, FilterExpr, ReadOptions, Record, RecordKind, Value,
};

fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| match r {
            Record::Array(row) => row[0].as_str().unwrap_or_default().to_owned(),
            Record::Object(obj) => obj
                .get("NAME")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        })
        .collect()
}

#[test]
fn filtered_read_stops_at_length() {
    let dataset = class_dataset();
    let metadata = dataset.metadata().unwrap();
    let expr = FilterExpr::cmp("AGE", CmpOp::Gt, 13.0).and(FilterExpr::cmp("sex", CmpOp::Eq, "M"));
    let filter = Filter::compile(&expr, &metadata).unwrap();

    let records = dataset
        .get_data(
            &ReadOptions::new()
                .with_length(5)
                .with_columns(["NAME", "AGE"])
                .with_filter(filter),
        )
        .unwrap();
    assert_eq!(
        names(&records),
        vec!["Alfred", "Henry", "Philip", "Ronald", "William"]
    );
    assert!(records.iter().all(|r| r.len() == 2));
}

#[test]
fn unfiltered_read_respects_start_and_length() {
    let dataset = class_dataset();
    let head = dataset
        .get_data(&ReadOptions::new().with_length(3))
        .unwrap();
    assert_eq!(names(&head), vec!["Alfred", "Alice", "Barbara"]);
    assert_eq!(
        head[0].as_array().unwrap(),
        &[text("Alfred"), text("M"), num(14.0), num(69.0), num(112.5)]
    );

    let tail = dataset.get_data(&ReadOptions::new().with_start(17)).unwrap();
    assert_eq!(names(&tail), vec!["Thomas", "William"]);

    let clipped = dataset
        .get_data(&ReadOptions::new().with_start(18).with_length(50))
        .unwrap();
    assert_eq!(names(&clipped), vec!["William"]);
}

#[test]
fn range_edges() {
    let dataset = class_dataset();
    let at_end = dataset.get_data(&ReadOptions::new().with_start(19)).unwrap();
    assert!(at_end.is_empty());

    let err = dataset
        .get_data(&ReadOptions::new().with_start(20))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);

    let err = dataset
        .get_data(&ReadOptions::new().with_length(0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    assert!(err.to_string().starts_with("invalid start/length parameter values"));
    assert_eq!(dataset.source().fetch_count(), 0);
}

#[test]
fn projection_keeps_request_order_for_arrays_and_schema_order_for_objects() {
    let dataset = class_dataset();
    let arrays = dataset
        .get_data(
            &ReadOptions::new()
                .with_length(1)
                .with_columns(["weight", "Name"]),
        )
        .unwrap();
    assert_eq!(arrays[0].as_array().unwrap(), &[num(112.5), text("Alfred")]);

    let objects = dataset
        .get_data(
            &ReadOptions::new()
                .with_length(1)
                .with_kind(RecordKind::Object)
                .with_columns(["weight", "Name"]),
        )
        .unwrap();
    let obj = objects[0].as_object().unwrap();
    let keys: Vec<&str> = obj.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["NAME", "WEIGHT"]);
    assert_eq!(
        serde_json::to_string(&objects[0]).unwrap(),
        r#"{"NAME":"Alfred","WEIGHT":112.5}"#
    );

    let err = dataset
        .get_data(&ReadOptions::new().with_columns(["NAME", "zip", "city"]))
        .unwrap_err();
    assert_eq!(err.to_string(), "columns zip, city not found");
}

#[test]
fn reads_are_repeatable() {
    let dataset = ages_dataset(500);
    let options = ReadOptions::new()
        .with_start(100)
        .with_length(40)
        .with_dynamic_length(true)
        .with_filter(|row: &[Value]| row[1].as_f64() == Some(12.0));
    let first = dataset.get_data(&options).unwrap();
    let second = dataset.get_data(&options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 20);
    assert!(first.iter().all(|r| r.len() == 2));
}
