use super::{check_row_args, RowSource, SourceColumn, SourceError, SourceSchema};
use csv::{ByteRecord, Position};
use encoding_rs::{Encoding, UTF_8};
use rowscope_model::{DataType, Row, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// Storage width reported for numeric columns.
const DOUBLE_WIDTH: u32 = 8;
/// Rows between remembered seek positions.
const CHECKPOINT_INTERVAL: usize = 1024;

#[derive(Clone, Copy, Debug)]
pub struct CsvSourceOptions {
    pub delimiter: u8,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: &'static Encoding,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: UTF_8,
        }
    }
}

impl CsvSourceOptions {
    /// Select the text encoding by WHATWG label (`utf-8`, `latin1`, `windows-1252`, ...).
    ///
    /// Fields are split on raw bytes before decoding, so only ASCII-compatible
    /// encodings are accepted; `utf-16le` and friends are rejected.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self, SourceError> {
        self.encoding = Encoding::for_label(label.as_bytes())
            .filter(|encoding| encoding.is_ascii_compatible())
            .ok_or_else(|| SourceError::UnsupportedEncoding(label.to_owned()))?;
        Ok(self)
    }
}

/// File length and mtime; a change drops the row index.
type FileStamp = (u64, Option<SystemTime>);

/// Byte positions of every `CHECKPOINT_INTERVAL`-th row, plus the row after
/// each fetch, so later fetches seek instead of re-parsing from the top.
#[derive(Debug)]
struct RowIndex {
    stamp: FileStamp,
    positions: BTreeMap<usize, Position>,
}

/// [`RowSource`] over delimited text files with a header row.
///
/// A column is numeric when every non-empty field parses as a number; empty
/// fields are missing values. Each call reopens the file and seeks to the
/// nearest remembered row position at or before its start row.
#[derive(Debug, Default)]
pub struct CsvSource {
    options: CsvSourceOptions,
    types: Mutex<HashMap<PathBuf, Arc<[DataType]>>>,
    index: Mutex<HashMap<PathBuf, RowIndex>>,
}

impl CsvSource {
    pub fn new(options: CsvSourceOptions) -> Self {
        Self {
            options,
            types: Mutex::new(HashMap::new()),
            index: Mutex::new(HashMap::new()),
        }
    }

    /// Open `path` with the header row already consumed.
    fn reader(
        &self,
        path: &Path,
    ) -> Result<(csv::Reader<BufReader<File>>, FileStamp), SourceError> {
        let encoding = self.options.encoding;
        if !encoding.is_ascii_compatible() {
            return Err(SourceError::UnsupportedEncoding(encoding.name().to_owned()));
        }
        let file = File::open(path)?;
        let meta = file.metadata()?;
        let stamp = (meta.len(), meta.modified().ok());
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));
        reader.byte_headers()?;
        Ok((reader, stamp))
    }

    /// Closest remembered position at or before row `start`.
    fn checkpoint(
        &self,
        path: &Path,
        stamp: FileStamp,
        start: usize,
    ) -> Option<(usize, Position)> {
        let index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = index.get(path).filter(|entry| entry.stamp == stamp)?;
        entry
            .positions
            .range(..=start)
            .next_back()
            .map(|(row, pos)| (*row, pos.clone()))
    }

    fn remember(&self, path: &Path, stamp: FileStamp, positions: Vec<(usize, Position)>) {
        if positions.is_empty() {
            return;
        }
        let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = index.entry(path.to_path_buf()).or_insert_with(|| RowIndex {
            stamp,
            positions: BTreeMap::new(),
        });
        if entry.stamp != stamp {
            log::debug!("{} changed on disk; dropping its row index", path.display());
            entry.stamp = stamp;
            entry.positions.clear();
        }
        entry.positions.extend(positions);
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> std::borrow::Cow<'a, str> {
        self.options.encoding.decode_without_bom_handling(bytes).0
    }

    fn column_types(&self, path: &Path) -> Result<Arc<[DataType]>, SourceError> {
        if let Some(types) = self
            .types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(types.clone());
        }
        let schema = self.fetch_schema(path)?;
        let types: Arc<[DataType]> = schema
            .columns
            .iter()
            .map(|c| DataType::from_source_type(&c.data_type))
            .collect();
        Ok(types)
    }
}

impl RowSource for CsvSource {
    fn fetch_schema(&self, path: &Path) -> Result<SourceSchema, SourceError> {
        let (mut reader, stamp) = self.reader(path)?;
        let headers = reader.byte_headers()?.clone();
        let names: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let name = self.decode(raw);
                let name = if idx == 0 {
                    name.trim_start_matches('\u{feff}')
                } else {
                    name.as_ref()
                };
                name.trim().to_owned()
            })
            .collect();

        let mut numeric = vec![true; names.len()];
        let mut widths = vec![0u32; names.len()];
        let mut records: i64 = 0;
        let mut record = ByteRecord::new();
        let mut checkpoints = Vec::new();
        loop {
            let pos = reader.position().clone();
            if !reader.read_byte_record(&mut record)? {
                break;
            }
            let row = records as usize;
            if row % CHECKPOINT_INTERVAL == 0 {
                checkpoints.push((row, pos));
            }
            records += 1;
            for (idx, raw) in record.iter().enumerate().take(names.len()) {
                let field = self.decode(raw);
                let field = field.trim();
                if field.is_empty() {
                    continue;
                }
                widths[idx] = widths[idx].max(field.len() as u32);
                if numeric[idx] && field.parse::<f64>().is_err() {
                    numeric[idx] = false;
                }
            }
        }

        let columns: Vec<SourceColumn> = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| SourceColumn {
                name,
                label: None,
                length: Some(if numeric[idx] {
                    DOUBLE_WIDTH
                } else {
                    widths[idx].max(1)
                }),
                data_type: if numeric[idx] { "double" } else { "text" }.to_owned(),
                display_format: None,
            })
            .collect();

        let types: Arc<[DataType]> = columns
            .iter()
            .map(|c| DataType::from_source_type(&c.data_type))
            .collect();
        self.types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), types);
        self.remember(path, stamp, checkpoints);

        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);

        Ok(SourceSchema {
            record_count: records,
            name: String::new(),
            label: String::new(),
            columns,
            created: None,
            modified,
            encoding: Some(self.options.encoding.name().to_owned()),
            compression: None,
        })
    }

    fn fetch_rows(
        &self,
        path: &Path,
        start_row: i64,
        row_count: i64,
    ) -> Result<Vec<Row>, SourceError> {
        let (start, limit) = check_row_args(start_row, row_count)?;
        let types = self.column_types(path)?;
        let (mut reader, stamp) = self.reader(path)?;

        let mut index = 0usize;
        if let Some((row, pos)) = self.checkpoint(path, stamp, start) {
            reader.seek(pos)?;
            index = row;
        }

        let mut rows = Vec::with_capacity(limit.unwrap_or(0).min(4096));
        let mut record = ByteRecord::new();
        let mut checkpoints = Vec::new();
        loop {
            let pos = reader.position().clone();
            if !reader.read_byte_record(&mut record)? {
                break;
            }
            if index % CHECKPOINT_INTERVAL == 0 {
                checkpoints.push((index, pos.clone()));
            }
            if index < start {
                index += 1;
                continue;
            }
            if limit.is_some_and(|limit| rows.len() >= limit) {
                // Where the next window starts.
                checkpoints.push((index, pos));
                break;
            }
            if record.len() > types.len() {
                return Err(SourceError::Corrupt {
                    row: index as u64,
                    reason: format!(
                        "expected {} fields, found {}",
                        types.len(),
                        record.len()
                    ),
                });
            }
            let mut row = Vec::with_capacity(types.len());
            for (col, data_type) in types.iter().enumerate() {
                let raw = record.get(col).unwrap_or_default();
                let field = self.decode(raw);
                let field = field.trim();
                let value = if field.is_empty() {
                    Value::Null
                } else {
                    match data_type {
                        DataType::Double => Value::Number(field.parse::<f64>().map_err(|_| {
                            SourceError::Corrupt {
                                row: index as u64,
                                reason: format!("field {col} is not numeric: {field:?}"),
                            }
                        })?),
                        DataType::String => Value::string(field),
                    }
                };
                row.push(value);
            }
            rows.push(row);
            index += 1;
        }
        self.remember(path, stamp, checkpoints);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(path: &Path) -> FileStamp {
        let meta = std::fs::metadata(path).unwrap();
        (meta.len(), meta.modified().ok())
    }

    #[test]
    fn fetches_leave_seek_positions_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut csv = String::from("id\n");
        for i in 0..3_000 {
            csv.push_str(&format!("{i}\n"));
        }
        std::fs::write(&path, csv).unwrap();

        let source = CsvSource::default();
        source.fetch_schema(&path).unwrap();
        let stamp = stamp(&path);
        let nearest = |row| source.checkpoint(&path, stamp, row).map(|(at, _)| at);
        assert_eq!(nearest(0), Some(0));
        assert_eq!(nearest(1_500), Some(1_024));
        assert_eq!(nearest(2_999), Some(2_048));

        source.fetch_rows(&path, 1_100, 50).unwrap();
        assert_eq!(nearest(1_150), Some(1_150));
        assert_eq!(nearest(1_149), Some(1_024));

        let other = (stamp.0 + 1, stamp.1);
        assert_eq!(source.checkpoint(&path, other, 1_500).map(|(at, _)| at), None);
    }

    #[test]
    fn wide_encodings_are_refused_before_reading() {
        let options = CsvSourceOptions {
            encoding: encoding_rs::UTF_16BE,
            ..CsvSourceOptions::default()
        };
        let err = CsvSource::new(options)
            .fetch_schema(Path::new("/nonexistent.csv"))
            .unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedEncoding(name) if name == "UTF-16BE"));
    }
}
