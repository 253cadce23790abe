//! Run orchestration
//!
//! [`BronzeRunner`] checks that the store is reachable, then walks the
//! configured datasets in order: load the file, insert it, record what
//! happened. A dataset that is missing or unreadable never stops the run;
//! only an unreachable store or a bad configuration does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::engine::{InsertMode, InsertionEngine, InsertionOutcome};
use super::error::IngestError;
use super::loader::load_table_with;
use crate::config::LoaderConfig;
use crate::database::{Connector, DatabaseError};

/// Fatal run errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The store could not be reached before any dataset was processed
    #[error("Connectivity check failed: {0}")]
    Connectivity(#[source] DatabaseError),

    /// The configuration cannot be run
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A dataset filter named a dataset that is not configured
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

/// A source file and the bronze table it loads into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Logical name, also the target table name
    pub name: String,
    /// Resolved source file path
    pub path: PathBuf,
}

impl DatasetDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// SHA-256 and size of a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub sha256: String,
    pub size_bytes: u64,
}

/// Compute the fingerprint of a source file
pub fn compute_file_fingerprint(path: &Path) -> Result<SourceFingerprint, IngestError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(SourceFingerprint {
        sha256: format!("{:x}", hasher.finalize()),
        size_bytes: content.len() as u64,
    })
}

/// What happened to one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetStatus {
    /// The file was loaded and handed to the engine
    Loaded { outcome: InsertionOutcome },
    /// The source file does not exist
    Missing,
    /// The source file could not be read
    Failed { error: String },
}

/// Per-dataset entry of a [`RunReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub name: String,
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: DatasetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<SourceFingerprint>,
}

impl DatasetReport {
    /// The insertion outcome, if the dataset got that far
    pub fn outcome(&self) -> Option<&InsertionOutcome> {
        match &self.status {
            DatasetStatus::Loaded { outcome } => Some(outcome),
            _ => None,
        }
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target: String,
    pub datasets: Vec<DatasetReport>,
}

impl RunReport {
    /// Rows committed across all datasets
    pub fn inserted(&self) -> usize {
        self.datasets
            .iter()
            .filter_map(DatasetReport::outcome)
            .map(|o| o.inserted)
            .sum()
    }

    /// Rows skipped across all datasets
    pub fn skipped(&self) -> usize {
        self.datasets
            .iter()
            .filter_map(DatasetReport::outcome)
            .map(|o| o.skipped)
            .sum()
    }

    /// Rows read across all loaded datasets
    pub fn total_rows(&self) -> usize {
        self.datasets
            .iter()
            .filter_map(DatasetReport::outcome)
            .map(|o| o.total)
            .sum()
    }

    pub fn missing_count(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| matches!(d.status, DatasetStatus::Missing))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| matches!(d.status, DatasetStatus::Failed { .. }))
            .count()
    }

    /// True if every dataset loaded with nothing skipped
    pub fn is_clean(&self) -> bool {
        self.datasets
            .iter()
            .all(|d| d.outcome().is_some_and(InsertionOutcome::is_success))
    }
}

/// Loads every configured dataset into the staging schema
pub struct BronzeRunner<'a> {
    connector: &'a dyn Connector,
    config: &'a LoaderConfig,
    mode: InsertMode,
    selected: Option<Vec<String>>,
}

impl<'a> BronzeRunner<'a> {
    /// Create a runner; the insert mode follows `load.fast_path`
    pub fn new(connector: &'a dyn Connector, config: &'a LoaderConfig) -> Self {
        let mode = if config.load.fast_path {
            InsertMode::Fast
        } else {
            InsertMode::Batched
        };
        Self {
            connector,
            config,
            mode,
            selected: None,
        }
    }

    /// Override the insert mode
    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict the run to the named datasets (configuration order is kept)
    pub fn select<I, S>(mut self, names: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.config.datasets.iter().any(|d| &d.name == *n))
        {
            return Err(LoadError::UnknownDataset(unknown.clone()));
        }
        self.selected = Some(names);
        Ok(self)
    }

    /// Datasets this run will process, in order
    pub fn datasets(&self) -> Vec<DatasetDescriptor> {
        self.config
            .dataset_descriptors()
            .into_iter()
            .filter(|d| {
                self.selected
                    .as_ref()
                    .is_none_or(|names| names.contains(&d.name))
            })
            .collect()
    }

    /// Open a connection, probe it and close it
    pub async fn check_connectivity(&self) -> Result<(), LoadError> {
        info!("Checking connectivity to {}", self.connector.describe());
        let mut connection = self
            .connector
            .connect()
            .await
            .map_err(LoadError::Connectivity)?;

        let alive = tokio::time::timeout(
            self.config.retry_policy().probe_timeout,
            connection.is_alive(),
        )
        .await
        .unwrap_or(false);
        connection.close();

        if alive {
            info!("Connection OK");
            Ok(())
        } else {
            Err(LoadError::Connectivity(DatabaseError::ConnectionFailed(
                "Liveness probe failed".to_string(),
            )))
        }
    }

    /// Check connectivity, then load every selected dataset
    pub async fn run(&self) -> Result<RunReport, LoadError> {
        self.config
            .validate()
            .map_err(|e| LoadError::Config(e.to_string()))?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting bronze load into {}", self.connector.describe());

        self.check_connectivity().await?;

        let engine = InsertionEngine::new(self.connector, self.config.database.schema.clone())
            .with_policy(self.config.retry_policy())
            .with_classifier(self.config.classifier());
        let options = self.config.loader_options();

        let mut reports = Vec::new();
        for dataset in self.datasets() {
            let report = self.load_dataset(&engine, &options, dataset).await;
            reports.push(report);
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            target: self.connector.describe(),
            datasets: reports,
        };
        info!(
            %run_id,
            inserted = report.inserted(),
            skipped = report.skipped(),
            missing = report.missing_count(),
            failed = report.failed_count(),
            "Bronze load finished"
        );
        Ok(report)
    }

    async fn load_dataset(
        &self,
        engine: &InsertionEngine<'_>,
        options: &super::loader::LoaderOptions,
        dataset: DatasetDescriptor,
    ) -> DatasetReport {
        let mut report = DatasetReport {
            name: dataset.name.clone(),
            source: dataset.path.clone(),
            status: DatasetStatus::Missing,
            fingerprint: None,
        };

        if !dataset.path.exists() {
            warn!(
                dataset = %dataset.name,
                "Source file {} not found, skipping",
                dataset.path.display()
            );
            return report;
        }

        info!(dataset = %dataset.name, "Loading {}", dataset.path.display());
        let table = match load_table_with(&dataset.path, options) {
            Ok(table) => table,
            Err(e) => {
                warn!(dataset = %dataset.name, "Failed to load source: {}", e);
                report.status = DatasetStatus::Failed {
                    error: e.to_string(),
                };
                return report;
            }
        };

        match compute_file_fingerprint(&dataset.path) {
            Ok(fingerprint) => report.fingerprint = Some(fingerprint),
            Err(e) => debug!(dataset = %dataset.name, "No fingerprint: {}", e),
        }

        info!(
            dataset = %dataset.name,
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded source"
        );

        let outcome = engine.insert(&table, &dataset.name, self.mode).await;
        if outcome.is_success() {
            info!(
                dataset = %dataset.name,
                "{}/{} rows inserted via {} path",
                outcome.inserted,
                outcome.total,
                outcome.path
            );
        } else {
            warn!(
                dataset = %dataset.name,
                "{}/{} rows inserted, {} skipped",
                outcome.inserted,
                outcome.total,
                outcome.skipped
            );
        }
        report.status = DatasetStatus::Loaded { outcome };
        report
    }
}
