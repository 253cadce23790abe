//! Insertion engine
//!
//! Pushes a [`Table`] into `<schema>.<target>`. The fast path writes every
//! row in one transaction; if anything goes wrong the whole table is sent
//! again through the batched path, where each batch gets its own transaction,
//! a liveness probe before every attempt and a bounded number of retries.
//!
//! Delivery is at-least-once: a commit whose acknowledgement is lost is
//! indistinguishable from a failed commit and will be retried.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::table::{Row, Table};
use crate::database::{
    Connector, DatabaseError, DatabaseResult, ErrorClassifier, FailureKind, InsertStatement,
    StagingConnection,
};

/// Default rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default attempts per batch, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Batch sizing and retry timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Rows per batch on the batched path
    pub batch_size: usize,
    /// Attempts per batch, including the first
    pub max_attempts: u32,
    /// Backoff step after a connection loss; the wait is `step * attempt`
    pub transient_backoff: Duration,
    /// Pause before retrying any other failure
    pub retry_delay: Duration,
    /// Upper bound on a liveness probe; a probe that times out counts as dead
    pub probe_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            transient_backoff: Duration::from_secs(3),
            retry_delay: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following failed attempt number `attempt` (1-based)
    pub fn backoff_for(&self, kind: FailureKind, attempt: u32) -> Duration {
        match kind {
            FailureKind::ConnectionLost => self.transient_backoff * attempt,
            FailureKind::Statement => self.retry_delay,
        }
    }
}

/// Insertion strategy requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Single transaction first, batched fallback on failure
    #[default]
    Fast,
    /// Batched from the start
    Batched,
}

/// Strategy that produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPath {
    Fast,
    Batched,
}

impl std::fmt::Display for InsertPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertPath::Fast => write!(f, "fast"),
            InsertPath::Batched => write!(f, "batched"),
        }
    }
}

/// Half-open row range `[start, end)` of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    /// Number of rows in the range
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for BatchRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Result of inserting one table
///
/// `inserted + skipped == total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionOutcome {
    /// Target table name (without schema)
    pub table: String,
    /// Rows in the source table
    pub total: usize,
    /// Rows committed
    pub inserted: usize,
    /// Rows abandoned after exhausting retries (or never attempted)
    pub skipped: usize,
    /// Path that produced the final counts
    pub path: InsertPath,
    /// Why the fast path was abandoned, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Why the table was not attempted at all, if it wasn't
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
    /// Row ranges of abandoned batches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_batches: Vec<BatchRange>,
    /// Connections replaced during the batched path
    pub reconnects: usize,
    pub duration_ms: u64,
}

impl InsertionOutcome {
    fn new(table: &str, total: usize, path: InsertPath) -> Self {
        Self {
            table: table.to_string(),
            total,
            inserted: 0,
            skipped: 0,
            path,
            fallback_reason: None,
            rejected_reason: None,
            skipped_batches: Vec::new(),
            reconnects: 0,
            duration_ms: 0,
        }
    }

    /// True if no row was skipped
    pub fn is_success(&self) -> bool {
        self.skipped == 0
    }
}

/// Connection state across the batches of one table
#[derive(Default)]
struct Session {
    connection: Option<Box<dyn StagingConnection>>,
    connects: usize,
}

impl Session {
    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

/// Inserts tables into the staging schema through a [`Connector`]
pub struct InsertionEngine<'a> {
    connector: &'a dyn Connector,
    schema: String,
    policy: RetryPolicy,
    classifier: ErrorClassifier,
}

impl<'a> InsertionEngine<'a> {
    /// Create an engine with default policy and classifier
    pub fn new(connector: &'a dyn Connector, schema: impl Into<String>) -> Self {
        Self {
            connector,
            schema: schema.into(),
            policy: RetryPolicy::default(),
            classifier: ErrorClassifier::default(),
        }
    }

    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the failure classifier
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Insert every row of `table` into `<schema>.<target>`
    ///
    /// Never fails: problems end up in the outcome's counts and reasons. An
    /// invalid schema, table or column name (anything outside
    /// `[A-Za-z_][A-Za-z0-9_]*`) is rejected before any connection is opened
    /// and the whole table counts as skipped.
    pub async fn insert(&self, table: &Table, target: &str, mode: InsertMode) -> InsertionOutcome {
        let started = Instant::now();
        let path = match mode {
            InsertMode::Fast => InsertPath::Fast,
            InsertMode::Batched => InsertPath::Batched,
        };
        let mut outcome = InsertionOutcome::new(target, table.row_count(), path);

        let statement = match InsertStatement::new(
            &self.schema,
            target,
            table.columns(),
            self.connector.placeholder_style(),
        ) {
            Ok(statement) => statement,
            Err(e) => {
                warn!(dataset = target, "Rejecting table: {}", e);
                outcome.skipped = table.row_count();
                if !table.is_empty() {
                    outcome.skipped_batches.push(BatchRange {
                        start: 0,
                        end: table.row_count(),
                    });
                }
                outcome.rejected_reason = Some(e.to_string());
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                return outcome;
            }
        };

        if table.is_empty() {
            info!(dataset = target, "No rows to insert");
            return outcome;
        }

        match mode {
            InsertMode::Fast => match self.insert_fast(&statement, table.rows()).await {
                Ok(()) => {
                    outcome.inserted = table.row_count();
                    info!(
                        dataset = target,
                        rows = outcome.inserted,
                        "Inserted {} rows into {} in one transaction",
                        outcome.inserted,
                        statement.qualified_table()
                    );
                }
                Err(e) => {
                    warn!(
                        dataset = target,
                        "Fast insert failed, falling back to batches of {}: {}",
                        self.policy.batch_size,
                        e
                    );
                    outcome.path = InsertPath::Batched;
                    outcome.fallback_reason = Some(e.to_string());
                    self.insert_batched(&statement, table, &mut outcome).await;
                }
            },
            InsertMode::Batched => self.insert_batched(&statement, table, &mut outcome).await,
        }

        outcome.duration_ms = started.elapsed().as_millis() as u64;
        outcome
    }

    async fn insert_fast(&self, statement: &InsertStatement, rows: &[Row]) -> DatabaseResult<()> {
        let mut connection = self.connector.connect().await?;
        let result = run_transaction(connection.as_mut(), statement, rows).await;
        if result.is_err() {
            rollback_quietly(connection.as_mut()).await;
        }
        connection.close();
        result
    }

    async fn insert_batched(
        &self,
        statement: &InsertStatement,
        table: &Table,
        outcome: &mut InsertionOutcome,
    ) {
        let target = outcome.table.clone();
        let batch_size = self.policy.batch_size.max(1);
        let batch_count = table.row_count().div_ceil(batch_size);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut session = Session::default();

        for (index, (start, rows)) in table.batches(batch_size).enumerate() {
            let range = BatchRange {
                start,
                end: start + rows.len(),
            };
            let mut attempt = 0u32;

            loop {
                attempt += 1;
                let result = match self.ensure_connection(&mut session).await {
                    Ok(connection) => {
                        let result = run_transaction(connection.as_mut(), statement, rows).await;
                        if result.is_err() {
                            rollback_quietly(connection.as_mut()).await;
                        }
                        result
                    }
                    Err(e) => Err(e),
                };

                let error = match result {
                    Ok(()) => {
                        outcome.inserted += rows.len();
                        info!(
                            dataset = %target,
                            batch_start = range.start,
                            batch_end = range.end,
                            attempt,
                            "Committed batch {}/{}",
                            index + 1,
                            batch_count
                        );
                        break;
                    }
                    Err(e) => e,
                };

                let kind = self.classify(&error);
                if attempt >= max_attempts {
                    warn!(
                        dataset = %target,
                        batch_start = range.start,
                        batch_end = range.end,
                        attempt,
                        "Skipping batch {}/{} after {} attempts ({}): {}",
                        index + 1,
                        batch_count,
                        attempt,
                        kind,
                        error
                    );
                    outcome.skipped += rows.len();
                    outcome.skipped_batches.push(range);
                    break;
                }

                let wait = self.policy.backoff_for(kind, attempt);
                warn!(
                    dataset = %target,
                    batch_start = range.start,
                    batch_end = range.end,
                    attempt,
                    "Batch {}/{} failed ({}), retrying in {:?}: {}",
                    index + 1,
                    batch_count,
                    kind,
                    wait,
                    error
                );
                tokio::time::sleep(wait).await;
            }
        }

        session.close();
        outcome.reconnects = session.connects.saturating_sub(1);
        info!(
            dataset = %target,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "Batched insert into {} finished",
            statement.qualified_table()
        );
    }

    /// Probe the current connection and replace it if it is missing or dead
    async fn ensure_connection<'s>(
        &self,
        session: &'s mut Session,
    ) -> DatabaseResult<&'s mut Box<dyn StagingConnection>> {
        let alive = match session.connection.as_mut() {
            Some(connection) => {
                tokio::time::timeout(self.policy.probe_timeout, connection.is_alive())
                    .await
                    .unwrap_or(false)
            }
            None => false,
        };

        if !alive {
            if session.connection.is_some() {
                warn!("Liveness probe failed, reconnecting to {}", self.connector.describe());
                session.close();
            }
            let connection = self.connector.connect().await?;
            session.connects += 1;
            session.connection = Some(connection);
        }

        session.connection.as_mut().ok_or_else(|| {
            DatabaseError::ConnectionFailed("No connection available".to_string())
        })
    }

    fn classify(&self, error: &DatabaseError) -> FailureKind {
        match error {
            DatabaseError::ConnectionFailed(_) => FailureKind::ConnectionLost,
            other => self.classifier.classify(&other.to_string()),
        }
    }
}

async fn run_transaction(
    connection: &mut dyn StagingConnection,
    statement: &InsertStatement,
    rows: &[Row],
) -> DatabaseResult<()> {
    connection.begin().await?;
    connection.insert_rows(statement, rows).await?;
    connection.commit().await
}

async fn rollback_quietly(connection: &mut dyn StagingConnection) {
    if let Err(e) = connection.rollback().await {
        debug!("Ignoring rollback error: {}", e);
    }
}
