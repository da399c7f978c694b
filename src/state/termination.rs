use crate::document::{Document, Fingerprint};
use std::fmt;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Every category was walked to its end
    Exhausted,

    /// A document matched the previous run's boundary document
    Boundary,

    /// The maximum document count was reached
    Capacity,
}

impl StopReason {
    /// Converts the stop reason to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Boundary => "boundary",
            Self::Capacity => "capacity",
        }
    }

    /// Parses a stop reason from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "exhausted" => Some(Self::Exhausted),
            "boundary" => Some(Self::Boundary),
            "capacity" => Some(Self::Capacity),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Crawl-wide accumulator and stopping bounds
///
/// Owned by the category crawler for the whole run and lent to the
/// deduplication gate for every extracted document.
#[derive(Debug, Clone)]
pub struct TerminationState {
    /// Accepted documents, in acceptance order
    pub documents: Vec<Document>,

    /// Fingerprint of the previous run's boundary document
    pub boundary: Option<Fingerprint>,

    /// Maximum number of documents to accept
    pub max_count: usize,

    /// Set once a stopping rule fired; never cleared
    pub stop: Option<StopReason>,
}

impl TerminationState {
    pub fn new(boundary: Option<Fingerprint>, max_count: usize) -> Self {
        Self {
            documents: Vec::new(),
            boundary,
            max_count,
            stop: None,
        }
    }

    /// Returns true if no more documents fit
    pub fn is_full(&self) -> bool {
        self.documents.len() >= self.max_count
    }

    /// Consumes the state, returning the accepted documents
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
