//! Append-only CSV table
//!
//! Column policy:
//! - a new file takes its columns from the first appended result set, in
//!   order of first appearance across its records
//! - an existing file keeps the columns of its header row
//! - a record missing a column gets an empty cell
//! - fields outside the header are dropped (logged once per window)

use csv::WriterBuilder;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{OutputError, OutputResult, TableAppender};
use crate::ResultSet;

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV table opened in append mode once per window
pub struct CsvTableAppender {
    path: PathBuf,
    columns: Option<Vec<String>>,
    rows_written: u64,
    buffer_size: usize,
}

impl CsvTableAppender {
    /// Create an appender for `path`. Nothing is touched on disk until the
    /// first non-empty append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create an appender with a custom write buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(path: P, buffer_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            columns: None,
            rows_written: 0,
            buffer_size,
        }
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written by this appender
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Header of the table, once known
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Header of an existing non-empty file, if any
    fn existing_header(&self) -> OutputResult<Option<Vec<String>>> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(OutputError::IoError(format!(
                    "Failed to stat {}: {e}",
                    self.path.display()
                )))
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| OutputError::CsvError(format!("Failed to open existing table: {e}")))?;
        let headers = reader
            .headers()
            .map_err(|e| OutputError::CsvError(format!("Failed to read existing header: {e}")))?;

        Ok(Some(headers.iter().map(str::to_string).collect()))
    }

    fn open_for_append(&self) -> OutputResult<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OutputError::IoError(format!("Failed to open file: {e}")))?;
        terminate_last_line(&mut file)?;
        Ok(file)
    }
}

impl TableAppender for CsvTableAppender {
    fn append(&mut self, result_set: ResultSet) -> OutputResult<usize> {
        let records = into_records(result_set)?;

        // Header resolution happens before anything is written
        let (columns, write_header) = match &self.columns {
            Some(columns) => (columns.clone(), false),
            None => match self.existing_header()? {
                Some(columns) => {
                    debug!(columns = columns.len(), "Appending to existing table");
                    (columns, false)
                }
                None => (columns_of(&records)?, true),
            },
        };

        let rows = to_rows(&records, &columns);

        let file = self.open_for_append()?;
        let buf_writer = BufWriter::with_capacity(self.buffer_size, file);
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(buf_writer);

        if write_header {
            info!(path = %self.path.display(), columns = columns.len(), "Writing table header");
            writer
                .write_record(&columns)
                .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;
        }

        for row in &rows {
            writer
                .write_record(row)
                .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush: {e}")))?;

        let buf_writer = writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        self.columns = Some(columns);
        self.rows_written += rows.len() as u64;
        Ok(rows.len())
    }
}

/// Append a newline if the file's last row is unterminated, so new rows never
/// join onto it
fn terminate_last_line(file: &mut File) -> OutputResult<()> {
    let len = file
        .metadata()
        .map_err(|e| OutputError::IoError(format!("Failed to stat file: {e}")))?
        .len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| OutputError::IoError(format!("Failed to read last byte: {e}")))?;
    if last[0] != b'\n' {
        warn!("Existing table ends without a newline; terminating its last row");
        file.write_all(b"\n")
            .map_err(|e| OutputError::IoError(format!("Failed to terminate last row: {e}")))?;
    }
    Ok(())
}

/// Interpret a payload as a list of records
fn into_records(result_set: ResultSet) -> OutputResult<Vec<Map<String, Value>>> {
    let items = match result_set.into_payload() {
        Value::Array(items) => items,
        other => {
            return Err(OutputError::UnexpectedShape(format!(
                "expected a JSON array of objects, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(OutputError::UnexpectedShape(format!(
                "record {index} is {}, expected an object",
                kind_of(&other)
            ))),
        })
        .collect()
}

/// Union of field names in order of first appearance
fn columns_of(records: &[Map<String, Value>]) -> OutputResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for key in records.iter().flat_map(|record| record.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.clone());
        }
    }

    if columns.is_empty() {
        return Err(OutputError::UnexpectedShape(
            "records have no fields".to_string(),
        ));
    }
    Ok(columns)
}

/// Project records onto `columns`, logging fields that do not fit
fn to_rows(records: &[Map<String, Value>], columns: &[String]) -> Vec<Vec<String>> {
    let known: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let mut dropped: Vec<&str> = Vec::new();

    let rows = records
        .iter()
        .map(|record| {
            for key in record.keys() {
                if !known.contains(key.as_str()) && !dropped.contains(&key.as_str()) {
                    dropped.push(key.as_str());
                }
            }
            columns
                .iter()
                .map(|column| record.get(column).map(render_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    if !dropped.is_empty() {
        warn!(fields = ?dropped, "Dropping fields not present in table header");
    }
    rows
}

/// Render one JSON value as a CSV cell
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
