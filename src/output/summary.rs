//! Output error type and the harvest summary record
//!
//! A [`HarvestSummary`] is everything the markdown report needs about one run,
//! loaded back from the run store.

use crate::document::Document;
use crate::storage::{FaultRecord, StorageError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No harvest runs found in database")]
    NoRuns,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub stop_reason: Option<String>,
    pub config_hash: String,

    // Documents of this run, in acceptance order
    pub documents: Vec<Document>,

    // Categories abandoned during this run
    pub faults: Vec<FaultRecord>,
}

impl HarvestSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Document counts per category label
    pub fn documents_by_category(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for doc in &self.documents {
            let label = doc.category().unwrap_or("(none)").to_string();
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Number of documents pointing at an external file
    pub fn file_documents(&self) -> usize {
        self.documents.iter().filter(|d| d.is_file()).count()
    }

    /// Number of documents with inline content
    pub fn native_documents(&self) -> usize {
        self.documents.len() - self.file_documents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_counts_by_category_and_layout() {
        let mut summary = HarvestSummary::new();
        summary.documents = vec![
            Document::native("a", "t", "https://hub.example/a", "News", None, Utc::now()),
            Document::native("b", "t", "https://hub.example/b", "News", None, Utc::now()),
            Document::file(
                "c",
                "abs",
                "https://cdn.example/c.pdf",
                "https://hub.example/c",
                "Reports",
                None,
                Utc::now(),
            ),
        ];

        let counts = summary.documents_by_category();
        assert_eq!(counts.get("News"), Some(&2));
        assert_eq!(counts.get("Reports"), Some(&1));
        assert_eq!(summary.file_documents(), 1);
        assert_eq!(summary.native_documents(), 2);
    }
}
