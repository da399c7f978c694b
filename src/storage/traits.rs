//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::document::Document;
use crate::state::StopReason;
use crate::storage::{FaultRecord, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the harvester.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new harvest run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets every run, oldest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    /// Marks a run as finished
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run to finish
    /// * `status` - Final status
    /// * `stop_reason` - Why the crawl stopped, `None` if it was aborted
    /// * `document_count` - Number of documents stored for the run
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stop_reason: Option<StopReason>,
        document_count: u64,
    ) -> StorageResult<()>;

    // ===== Documents =====

    /// Stores the accepted documents of a run, in acceptance order
    ///
    /// Positions start at 0. All documents are written in one transaction.
    fn insert_documents(&mut self, run_id: i64, documents: &[Document]) -> StorageResult<()>;

    /// Gets the documents of a run, in acceptance order
    fn get_documents(&self, run_id: i64) -> StorageResult<Vec<Document>>;

    /// Loads the boundary document for the next incremental run
    ///
    /// This is the first accepted document (position 0) of the most recent
    /// run that stored any documents. Listings are newest-first, so it is the
    /// newest item the previous run saw.
    fn load_boundary_document(&self) -> StorageResult<Option<Document>>;

    // ===== Faults =====

    /// Records a category fault
    fn record_fault(
        &mut self,
        run_id: i64,
        category: &str,
        kind: &str,
        url: &str,
        message: &str,
    ) -> StorageResult<()>;

    /// Gets the faults recorded for a run
    fn get_faults(&self, run_id: i64) -> StorageResult<Vec<FaultRecord>>;

    // ===== Statistics =====

    /// Gets total run count
    fn count_runs(&self) -> StorageResult<u64>;

    /// Gets total document count across all runs
    fn count_documents(&self) -> StorageResult<u64>;

    /// Gets document counts by category label, across all runs
    fn count_documents_by_category(&self) -> StorageResult<BTreeMap<String, u64>>;

    /// Gets fault counts by kind, across all runs
    fn get_fault_summary(&self) -> StorageResult<BTreeMap<String, u64>>;
}
