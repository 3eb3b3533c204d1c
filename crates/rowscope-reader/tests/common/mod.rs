#![allow(dead_code)]

use rowscope_reader::source::{MemorySource, MemoryTable, SourceColumn};
use rowscope_reader::{Dataset, DatasetOptions, Row, Value};
use std::path::Path;

pub const CLASS_PATH: &str = "/data/class.sas7bdat";
pub const AGES_PATH: &str = "/data/ages.sas7bdat";

pub fn column(name: &str, data_type: &str) -> SourceColumn {
    SourceColumn {
        name: name.to_owned(),
        label: None,
        length: Some(8),
        data_type: data_type.to_owned(),
        display_format: None,
    }
}

/// The 19-row student table used across the reader tests.
pub fn class_table() -> MemoryTable {
    let data: [(&str, &str, f64, f64, f64); 19] = [
        ("Alfred", "M", 14.0, 69.0, 112.5),
        ("Alice", "F", 13.0, 56.5, 84.0),
        ("Barbara", "F", 13.0, 65.3, 98.0),
        ("Carol", "F", 14.0, 62.8, 102.5),
        ("Henry", "M", 14.0, 63.5, 102.5),
        ("James", "M", 12.0, 57.3, 83.0),
        ("Jane", "F", 12.0, 59.8, 84.5),
        ("Janet", "F", 15.0, 62.5, 112.5),
        ("Jeffrey", "M", 13.0, 62.5, 84.0),
        ("John", "M", 12.0, 59.0, 99.5),
        ("Joyce", "F", 11.0, 51.3, 50.5),
        ("Judy", "F", 14.0, 64.3, 90.0),
        ("Louise", "F", 12.0, 56.3, 77.0),
        ("Mary", "F", 15.0, 66.5, 112.0),
        ("Philip", "M", 16.0, 72.0, 150.0),
        ("Robert", "M", 12.0, 64.8, 128.0),
        ("Ronald", "M", 15.0, 67.0, 133.0),
        ("Thomas", "M", 11.0, 57.5, 85.0),
        ("William", "M", 15.0, 66.5, 112.0),
    ];
    let rows: Vec<Row> = data
        .iter()
        .map(|(name, sex, age, height, weight)| {
            vec![
                Value::from(*name),
                Value::from(*sex),
                Value::Number(*age),
                Value::Number(*height),
                Value::Number(*weight),
            ]
        })
        .collect();
    let mut table = MemoryTable::new(
        "class",
        vec![
            column("NAME", "text"),
            column("SEX", "text"),
            column("AGE", "double"),
            column("HEIGHT", "double"),
            column("WEIGHT", "double"),
        ],
        rows,
    );
    table.schema.label = "Student Data".to_owned();
    table
}

/// `n` rows: `ID` is the row offset, `AGE` cycles through 10..30.
pub fn ages_table(n: usize) -> MemoryTable {
    let rows = (0..n)
        .map(|i| vec![Value::Number(i as f64), Value::Number((10 + i % 20) as f64)])
        .collect();
    MemoryTable::new(
        "ages",
        vec![column("ID", "double"), column("AGE", "double")],
        rows,
    )
}

pub fn open(path: &str, table: MemoryTable) -> Dataset<MemorySource> {
    Dataset::open(
        path,
        MemorySource::new().with_table(path, table),
        DatasetOptions::default(),
    )
    .expect("open dataset")
}

pub fn class_dataset() -> Dataset<MemorySource> {
    open(CLASS_PATH, class_table())
}

pub fn ages_dataset(n: usize) -> Dataset<MemorySource> {
    open(AGES_PATH, ages_table(n))
}

pub fn path(p: &str) -> &Path {
    Path::new(p)
}

pub fn num(v: f64) -> Value {
    Value::Number(v)
}

pub fn text(v: &str) -> Value {
    Value::from(v)
}
