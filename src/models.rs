//! Data models for the document checker.
//!
//! This module contains the records streamed by the backend and the
//! report structures built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity level of a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Weak contradiction or loosely related sentences
    #[serde(alias = "low", alias = "LOW")]
    Low,
    /// Confident contradiction
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    /// Confident contradiction between closely related sentences
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🔴",
        }
    }
}

/// One detected conflict between two sentences from two documents.
///
/// Records are immutable once received and are never merged or
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionRecord {
    /// Name of the first document.
    pub doc1: String,
    /// Name of the second document.
    pub doc2: String,
    /// Sentence taken from `doc1`.
    pub sentence1: String,
    /// Sentence taken from `doc2`.
    pub sentence2: String,
    /// Severity assigned by the backend.
    pub severity: Severity,
    /// Confidence percentage, nominally in `[0, 100]`.
    pub confidence: f64,
    /// Similarity score, scale defined by the backend.
    pub similarity: f64,
}

impl ContradictionRecord {
    /// Key naming the document pair, e.g. `a.txt ↔ b.txt`.
    pub fn pair_key(&self) -> String {
        format!("{} ↔ {}", self.doc1, self.doc2)
    }
}

/// Summary of contradictions received during a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContradictionSummary {
    /// Total number of contradictions.
    pub total: usize,
    /// Number of high severity contradictions.
    pub high: usize,
    /// Number of medium severity contradictions.
    pub medium: usize,
    /// Number of low severity contradictions.
    pub low: usize,
    /// Contradictions grouped by document pair, keyed in sorted order.
    pub by_pair: BTreeMap<String, usize>,
}

impl ContradictionSummary {
    /// Creates a summary from a list of records.
    pub fn from_records(records: &[ContradictionRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }

            *summary.by_pair.entry(record.pair_key()).or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about a check report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Base URL of the analysis backend.
    pub server_url: String,
    /// Session identifier issued by the backend, if the upload succeeded.
    pub session_id: Option<String>,
    /// Date and time of the check.
    pub analysis_date: DateTime<Utc>,
    /// Names of the submitted documents, in upload order.
    pub documents: Vec<String>,
    /// Final session status as displayed.
    pub final_status: String,
    /// Whether the stream reached its `done` event.
    pub complete: bool,
    /// Total number of contradictions received (before filtering).
    pub total_received: usize,
    /// Duration of the session in seconds.
    pub duration_seconds: f64,
}

/// The complete contradiction report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Reported contradictions, highest severity first.
    pub contradictions: Vec<ContradictionRecord>,
    /// Summary statistics of the reported contradictions.
    pub summary: ContradictionSummary,
}
