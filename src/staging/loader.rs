//! CSV source loading
//!
//! Reads a whole delimited file into a [`Table`]. Only the header row is
//! touched (see [`normalize_headers`]); cell values are kept byte for byte,
//! except that empty cells (and any configured null markers) become `None`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use super::error::IngestError;
use super::normalize::normalize_headers;
use super::table::{Row, Table};

/// Options for reading source files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Cell values treated as absent in addition to the empty string
    pub null_markers: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_markers: Vec::new(),
        }
    }
}

impl LoaderOptions {
    fn is_null(&self, value: &str) -> bool {
        value.is_empty() || self.null_markers.iter().any(|m| m == value)
    }
}

/// Load a CSV file with default options
pub fn load_table(path: &Path) -> Result<Table, IngestError> {
    load_table_with(path, &LoaderOptions::default())
}

/// Load a CSV file
///
/// # Errors
/// * `SourceNotFound` - the path does not exist
/// * `MalformedSource` - a row's cell count differs from the header's
/// * `EmptySource` - no header row
pub fn load_table_with(path: &Path, options: &LoaderOptions) -> Result<Table, IngestError> {
    if !path.exists() {
        return Err(IngestError::SourceNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    read_table(file, options, path)
}

/// Read a table from any reader; `source` is only used in error messages
pub fn read_table<R: Read>(
    reader: R,
    options: &LoaderOptions,
    source: &Path,
) -> Result<Table, IngestError> {
    let csv_error = |e: csv::Error| IngestError::Csv {
        path: source.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(IngestError::EmptySource(source.to_path_buf()));
    }

    let raw_headers: Vec<&str> = headers.iter().collect();
    let columns = normalize_headers(&raw_headers);

    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;

        if record.len() != columns.len() {
            return Err(IngestError::MalformedSource {
                path: source.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: columns.len(),
                found: record.len(),
            });
        }

        rows.push(
            record
                .iter()
                .map(|value| {
                    if options.is_null(value) {
                        None
                    } else {
                        Some(value.to_string())
                    }
                })
                .collect(),
        );
    }

    tracing::debug!(
        "Read {} rows x {} columns from {}",
        rows.len(),
        columns.len(),
        source.display()
    );

    Table::new(columns, rows)
}
