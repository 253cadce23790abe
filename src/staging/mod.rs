//! Bronze staging pipeline
//!
//! Takes raw CSV exports and lands them, untyped, in the staging schema of the
//! warehouse.
//!
//! ## Flow
//!
//! - **Normalize** - clean header labels into identifiers and disambiguate duplicates
//! - **Load** - read a whole CSV file into a [`Table`] of optional string cells
//! - **Insert** - push the table through the [`InsertionEngine`] (fast path first,
//!   batched retrying fallback second)
//! - **Run** - [`BronzeRunner`] repeats the above for every configured dataset
//!
//! ## Example
//!
//! ```rust,ignore
//! use bronze_loader::{BronzeRunner, LoaderConfig, connector_from_config};
//!
//! let config = LoaderConfig::load(Path::new("bronze-loader.toml"))?;
//! let connector = connector_from_config(&config)?;
//! let report = BronzeRunner::new(connector.as_ref(), &config).run().await?;
//! println!("{} rows inserted", report.inserted());
//! ```

mod engine;
mod error;
mod loader;
mod normalize;
mod runner;
mod table;

pub use engine::{
    BatchRange, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, InsertMode, InsertPath,
    InsertionEngine, InsertionOutcome, RetryPolicy,
};
pub use error::IngestError;
pub use loader::{LoaderOptions, load_table, load_table_with, read_table};
pub use normalize::{clean_column_name, normalize_headers};
pub use runner::{
    BronzeRunner, DatasetDescriptor, DatasetReport, DatasetStatus, LoadError, RunReport,
    SourceFingerprint, compute_file_fingerprint,
};
pub use table::{Cell, Row, Table, is_column_identifier};
