//! Reading and writing header records in JSON-lines format.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::api::record::Record;
use crate::error::{Error, Result};

/// Write a collection of records to a file in JSON-lines format
pub fn write_jsonl_file<P: AsRef<Path>>(file_path: P, records: &[Record]) -> Result<()> {
    let path = file_path.as_ref();
    let mut file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    for (index, record) in records.iter().enumerate() {
        let json_line = record.to_jsonl_string().map_err(|source| Error::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        writeln!(file, "{json_line}").map_err(|e| Error::io(path, e))?;
    }
    file.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Read records from a JSON-lines file
pub fn read_jsonl_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<Record>> {
    let path = file_path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_jsonl(path, &content)
}

/// Parse JSON-lines content; `path` is only used for error reporting
pub fn parse_jsonl<P: AsRef<Path>>(path: P, content: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: Record = serde_json::from_str(line).map_err(|source| Error::Json {
            path: path.as_ref().to_path_buf(),
            line: line_num + 1,
            source,
        })?;

        records.push(record);
    }

    Ok(records)
}
