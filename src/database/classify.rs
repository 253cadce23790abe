//! Failure classification for batch retries
//!
//! Drivers do not expose a stable "the link is gone" signal, so this is a
//! heuristic: the error text is searched (case-insensitively) for known
//! connection-loss markers. The marker list is configurable because driver
//! wording changes between versions.

use serde::{Deserialize, Serialize};

/// Default connection-loss markers
pub const DEFAULT_CONNECTION_LOSS_INDICATORS: &[&str] = &[
    "communication link failure",
    "08s01",
    "08001",
    "08003",
    "08006",
    "tcp provider",
    "link failure",
    "connection closed",
    "connection reset",
    "connection refused",
    "broken pipe",
    "timed out",
    "timeout",
    "server closed the connection",
    "unexpected eof",
];

/// Kind of a failed batch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The link to the store was lost; retried with linear backoff
    ConnectionLost,
    /// Anything else (constraint, type, syntax...); retried after a short pause
    Statement,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ConnectionLost => write!(f, "connection lost"),
            FailureKind::Statement => write!(f, "statement error"),
        }
    }
}

/// Maps raw driver error text to a [`FailureKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    indicators: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_LOSS_INDICATORS.iter().copied())
    }
}

impl ErrorClassifier {
    /// Create a classifier from a list of markers
    pub fn new<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            indicators: indicators
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Markers in use (lowercased)
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Classify an error message
    pub fn classify(&self, message: &str) -> FailureKind {
        let lower = message.to_ascii_lowercase();
        if self.indicators.iter().any(|marker| lower.contains(marker)) {
            FailureKind::ConnectionLost
        } else {
            FailureKind::Statement
        }
    }
}
