//! Preview command
//!
//! Loads one CSV file and shows what the loader makes of it, without touching
//! the database.

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::staging::{LoaderOptions, Table, compute_file_fingerprint, load_table_with};

/// Preview command arguments
#[derive(Debug, Clone)]
pub struct PreviewArgs {
    /// CSV file to load
    pub file: PathBuf,
    /// Field delimiter
    pub delimiter: char,
    /// Number of rows to print
    pub rows: usize,
}

/// Load the file and print normalized columns, row count and sample rows
pub fn handle_preview(args: &PreviewArgs) -> Result<(), CliError> {
    if !args.file.exists() {
        return Err(CliError::FileNotFound(args.file.clone()));
    }
    if !args.delimiter.is_ascii() {
        return Err(CliError::InvalidArgument(format!(
            "Delimiter must be a single ASCII character, got {:?}",
            args.delimiter
        )));
    }

    let options = LoaderOptions {
        delimiter: args.delimiter as u8,
        ..Default::default()
    };
    let table = load_table_with(&args.file, &options)?;
    let fingerprint = compute_file_fingerprint(&args.file)?;

    println!("File:    {}", args.file.display());
    println!("SHA-256: {}", fingerprint.sha256);
    print!("{}", format_preview(&table, args.rows));
    Ok(())
}

/// Columns, row count and the first `rows` rows
pub fn format_preview(table: &Table, rows: usize) -> String {
    let mut out = format!(
        "Columns ({}): {}\nRows:    {}\n",
        table.column_count(),
        table.columns().join(", "),
        table.row_count()
    );
    for row in table.rows().iter().take(rows) {
        let cells: Vec<&str> = row
            .iter()
            .map(|cell| cell.as_deref().unwrap_or("NULL"))
            .collect();
        out.push_str(&format!("  {}\n", cells.join(" | ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_preview() {
        let table = Table::new(
            vec!["Event_Name".to_string(), "Date".to_string()],
            vec![
                vec![Some("UFC 1".to_string()), None],
                vec![Some("UFC 2".to_string()), Some("1994-03-11".to_string())],
            ],
        )
        .unwrap();

        let preview = format_preview(&table, 1);
        assert_eq!(
            preview,
            "Columns (2): Event_Name, Date\nRows:    2\n  UFC 1 | NULL\n"
        );
    }

    #[test]
    fn test_preview_missing_file() {
        let args = PreviewArgs {
            file: PathBuf::from("/nonexistent/Events.csv"),
            delimiter: ',',
            rows: 5,
        };
        assert!(matches!(
            handle_preview(&args),
            Err(CliError::FileNotFound(_))
        ));
    }
}
