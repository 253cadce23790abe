//! Bronze Loader - CSV exports into bronze staging tables
//!
//! Provides:
//! - Header normalization for target-safe column identifiers
//! - CSV loading into an untyped in-memory table
//! - Connection management for DuckDB and PostgreSQL staging stores
//! - A resilient insertion engine (single-transaction fast path with a
//!   batched, retrying fallback)
//! - A run orchestrator that loads every configured dataset in turn

pub mod config;
pub mod database;
pub mod staging;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::LoaderConfig;
pub use database::{
    Connector, DatabaseError, DatabaseResult, ErrorClassifier, FailureKind, InsertStatement,
    StagingConnection, connector_from_config,
};
pub use staging::{
    BronzeRunner, DatasetDescriptor, DatasetReport, DatasetStatus, IngestError, InsertMode,
    InsertPath, InsertionEngine, InsertionOutcome, LoadError, LoaderOptions, RetryPolicy,
    RunReport, Table, load_table, load_table_with, normalize_headers,
};
