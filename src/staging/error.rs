//! Errors raised while reading source files

use std::path::PathBuf;

/// Error type for source loading
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The configured source file does not exist
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A data row does not have as many cells as the header
    #[error(
        "Malformed source {}: line {line} has {found} cells, expected {expected}",
        .path.display()
    )]
    MalformedSource {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The file has no header row
    #[error("Source {} is empty (no header row)", .0.display())]
    EmptySource(PathBuf),

    /// Any other CSV parse failure
    #[error("Failed to parse {}: {message}", .path.display())]
    Csv { path: PathBuf, message: String },

    /// A row handed to [`crate::staging::Table::new`] has the wrong width
    #[error("Row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A column name is not a valid staging identifier
    #[error("Invalid column name: {0:?}")]
    InvalidColumn(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
