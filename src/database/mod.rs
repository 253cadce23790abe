//! Staging store connections
//!
//! This module provides the connection layer the insertion engine runs on:
//! - DuckDB: embedded database file (default)
//! - PostgreSQL: network store, for a shared warehouse
//!
//! Connections are never pooled. A [`Connector`] hands out one exclusively
//! owned [`StagingConnection`] at a time; the owner replaces it wholesale when
//! the liveness probe fails.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod classify;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::{DuckDBConnection, DuckDBConnector};

#[cfg(feature = "postgres-backend")]
pub use self::postgres::{PostgresConnection, PostgresConnector};

pub use classify::{DEFAULT_CONNECTION_LOSS_INDICATORS, ErrorClassifier, FailureKind};

use crate::config::{DatabaseBackendType, LoaderConfig};
use crate::staging::Row;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin/commit/rollback failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Bind parameter syntax of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?, ?, ?` (DuckDB)
    QuestionMark,
    /// `$1, $2, $3` (PostgreSQL)
    Numbered,
}

// Unquoted identifiers may not start with a digit
static RE_SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

fn check_identifier(kind: &str, name: &str) -> DatabaseResult<()> {
    if RE_SQL_IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidInput(format!(
            "{} {:?} is not a valid identifier",
            kind, name
        )))
    }
}

/// A parameterized `INSERT INTO <schema>.<table> (...) VALUES (...)`
///
/// Identifiers are validated rather than quoted, so the store folds their
/// case the same way it did when the bronze tables were created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    schema: String,
    table: String,
    columns: Vec<String>,
    sql: String,
}

impl InsertStatement {
    /// Build the statement for a target table
    pub fn new(
        schema: &str,
        table: &str,
        columns: &[String],
        style: PlaceholderStyle,
    ) -> DatabaseResult<Self> {
        check_identifier("Schema", schema)?;
        check_identifier("Table", table)?;
        if columns.is_empty() {
            return Err(DatabaseError::InvalidInput(format!(
                "Table {} has no columns",
                table
            )));
        }
        for column in columns {
            check_identifier("Column", column)?;
        }

        let placeholders: Vec<String> = (1..=columns.len())
            .map(|i| match style {
                PlaceholderStyle::QuestionMark => "?".to_string(),
                PlaceholderStyle::Numbered => format!("${}", i),
            })
            .collect();

        let sql = format!(
            "INSERT INTO {}.{} ({}) VALUES ({})",
            schema,
            table,
            columns.join(","),
            placeholders.join(",")
        );

        Ok(Self {
            schema: schema.to_string(),
            table: table.to_string(),
            columns: columns.to_vec(),
            sql,
        })
    }

    /// The SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// `schema.table`
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Number of bind parameters per row
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// A live, exclusively owned link to the staging store
///
/// Implementations prepare the insert statement on first use and keep it for
/// their own lifetime only, so a replacement connection always starts with a
/// fresh statement handle.
#[async_trait(?Send)]
pub trait StagingConnection {
    /// Round-trip `SELECT 1`; false on any failure, never an error
    async fn is_alive(&mut self) -> bool;

    /// Open a transaction
    async fn begin(&mut self) -> DatabaseResult<()>;

    /// Execute the statement once per row inside the open transaction
    ///
    /// # Returns
    /// Number of rows written
    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Row],
    ) -> DatabaseResult<u64>;

    /// Commit the open transaction
    async fn commit(&mut self) -> DatabaseResult<()>;

    /// Roll back the open transaction
    async fn rollback(&mut self) -> DatabaseResult<()>;

    /// Release the connection; errors are swallowed since the link may
    /// already be gone
    fn close(self: Box<Self>);
}

/// Opens connections to one staging store
#[async_trait(?Send)]
pub trait Connector {
    /// Open a new connection
    async fn connect(&self) -> DatabaseResult<Box<dyn StagingConnection>>;

    /// Bind parameter syntax for this backend
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Backend type name ("duckdb" or "postgres")
    fn backend_type(&self) -> &'static str;

    /// Human-readable target description, safe to log
    fn describe(&self) -> String;
}

/// Build the connector selected by the configuration
pub fn connector_from_config(config: &LoaderConfig) -> DatabaseResult<Box<dyn Connector>> {
    match config.database.backend {
        DatabaseBackendType::DuckDB => {
            #[cfg(feature = "duckdb-backend")]
            {
                Ok(Box::new(DuckDBConnector::new(config.duckdb_path())))
            }
            #[cfg(not(feature = "duckdb-backend"))]
            {
                Err(DatabaseError::ConfigError(
                    "DuckDB backend not enabled. Build with --features duckdb-backend".to_string(),
                ))
            }
        }
        DatabaseBackendType::Postgres => {
            #[cfg(feature = "postgres-backend")]
            {
                let connection_string =
                    config.postgres_connection_string().ok_or_else(|| {
                        DatabaseError::ConfigError(
                            "PostgreSQL connection string not configured".to_string(),
                        )
                    })?;
                Ok(Box::new(PostgresConnector::new(
                    connection_string,
                    config.connect_timeout(),
                )))
            }
            #[cfg(not(feature = "postgres-backend"))]
            {
                Err(DatabaseError::ConfigError(
                    "PostgreSQL backend not enabled. Build with --features postgres-backend"
                        .to_string(),
                ))
            }
        }
    }
}

/// Mask the password in a connection string
pub fn mask_connection_string(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.find('@')
        && let Some(colon_pos) = connection_string[..at_pos].rfind(':')
        && !connection_string[colon_pos..].starts_with("://")
    {
        let prefix = &connection_string[..colon_pos + 1];
        let suffix = &connection_string[at_pos..];
        return format!("{}****{}", prefix, suffix);
    }
    connection_string.to_string()
}
