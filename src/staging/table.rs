//! In-memory table of untyped cells

use serde::Serialize;

use super::error::IngestError;

/// A single cell; `None` marks a value absent in the source
pub type Cell = Option<String>;

/// One data row, in column order
pub type Row = Vec<Cell>;

/// Returns true if `name` only uses `[A-Za-z0-9_]`
///
/// The empty string is accepted here: it is a legal output of the header
/// normalizer even though no store will take it as a column name.
pub fn is_column_identifier(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A loaded source file: normalized column names plus raw string rows
///
/// No type coercion happens here; numbers and dates are interpreted by the
/// target store when the row is inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table, checking that every row matches the column count
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, IngestError> {
        if let Some(bad) = columns.iter().find(|c| !is_column_identifier(c)) {
            return Err(IngestError::InvalidColumn(bad.clone()));
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(IngestError::RowWidth {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Column names in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All data rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Contiguous batches of at most `size` rows, with the offset of each
    pub fn batches(&self, size: usize) -> impl Iterator<Item = (usize, &[Row])> {
        let size = size.max(1);
        self.rows
            .chunks(size)
            .enumerate()
            .map(move |(index, chunk)| (index * size, chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_new_rejects_short_row() {
        let err = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![row(&["1", "2"]), row(&["3"])],
        )
        .unwrap_err();

        match err {
            IngestError::RowWidth {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 1);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_rejects_unclean_column() {
        let err = Table::new(vec!["Event Name".to_string()], Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidColumn(name) if name == "Event Name"));
    }

    #[test]
    fn test_batches_cover_all_rows() {
        let rows: Vec<Row> = (0..7).map(|i| row(&[&i.to_string()])).collect();
        let table = Table::new(vec!["n".to_string()], rows).unwrap();

        let batches: Vec<(usize, usize)> = table
            .batches(3)
            .map(|(start, chunk)| (start, chunk.len()))
            .collect();
        assert_eq!(batches, vec![(0, 3), (3, 3), (6, 1)]);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(vec!["a".to_string()], Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.batches(10).count(), 0);
    }
}
