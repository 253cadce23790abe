//! DuckDB staging backend
//!
//! Embedded database file; every [`DuckDBConnector::connect`] opens the file
//! anew, so dropping a connection and reconnecting is cheap and leaves
//! committed batches on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{
    Connector, DatabaseError, DatabaseResult, InsertStatement, PlaceholderStyle,
    StagingConnection,
};
use crate::staging::Row;

/// Opens connections to a DuckDB database file
#[derive(Debug, Clone)]
pub struct DuckDBConnector {
    /// Path to the database file
    db_path: PathBuf,
}

impl DuckDBConnector {
    /// Create a connector for a database file
    ///
    /// The file is created on first connect if it does not exist.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait(?Send)]
impl Connector for DuckDBConnector {
    async fn connect(&self) -> DatabaseResult<Box<dyn StagingConnection>> {
        let connection = duckdb::Connection::open(&self.db_path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!(
                "Failed to open DuckDB {}: {}",
                self.db_path.display(),
                e
            ))
        })?;

        Ok(Box::new(DuckDBConnection { connection }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }

    fn describe(&self) -> String {
        format!("duckdb:{}", self.db_path.display())
    }
}

/// One open DuckDB connection
pub struct DuckDBConnection {
    connection: duckdb::Connection,
}

impl DuckDBConnection {
    fn execute_control(&self, sql: &str) -> DatabaseResult<()> {
        self.connection
            .execute_batch(sql)
            .map_err(|e| DatabaseError::TransactionFailed(format!("{} failed: {}", sql, e)))
    }
}

#[async_trait(?Send)]
impl StagingConnection for DuckDBConnection {
    async fn is_alive(&mut self) -> bool {
        self.connection
            .query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .is_ok()
    }

    async fn begin(&mut self) -> DatabaseResult<()> {
        self.execute_control("BEGIN TRANSACTION")
    }

    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Row],
    ) -> DatabaseResult<u64> {
        // Cached per connection: a reconnect gets a fresh prepared statement
        let mut stmt = self
            .connection
            .prepare_cached(statement.sql())
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let mut written = 0u64;
        for row in rows {
            let params: Vec<Option<&str>> = row.iter().map(|cell| cell.as_deref()).collect();
            written += stmt
                .execute(duckdb::params_from_iter(params))
                .map_err(|e| {
                    DatabaseError::QueryFailed(format!(
                        "Insert into {} failed: {}",
                        statement.qualified_table(),
                        e
                    ))
                })? as u64;
        }

        Ok(written)
    }

    async fn commit(&mut self) -> DatabaseResult<()> {
        self.execute_control("COMMIT")
    }

    async fn rollback(&mut self) -> DatabaseResult<()> {
        self.execute_control("ROLLBACK")
    }

    fn close(self: Box<Self>) {
        if let Err((_, e)) = self.connection.close() {
            tracing::debug!("Ignoring DuckDB close error: {}", e);
        }
    }
}
