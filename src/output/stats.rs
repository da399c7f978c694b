//! Statistics generation from the run store
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use std::collections::BTreeMap;

/// Harvest statistics across every run in the store
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Number of runs recorded
    pub total_runs: u64,

    /// Number of documents stored across all runs
    pub total_documents: u64,

    /// Document counts by category label
    pub documents_by_category: BTreeMap<String, u64>,

    /// Fault counts by kind
    pub fault_summary: BTreeMap<String, u64>,

    /// The most recent run
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_runs: storage.count_runs()?,
        total_documents: storage.count_documents()?,
        documents_by_category: storage.count_documents_by_category()?,
        fault_summary: storage.get_fault_summary()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Runs: {}", stats.total_runs);
    println!("  Documents stored: {}", stats.total_documents);
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        println!("  Status: {}", run.status.to_db_string());
        println!(
            "  Stop reason: {}",
            run.stop_reason.map(|r| r.to_db_string()).unwrap_or("-")
        );
        println!("  Documents: {}", run.document_count);
        println!();
    }

    if !stats.documents_by_category.is_empty() {
        println!("Documents by Category:");
        let mut counts: Vec<_> = stats.documents_by_category.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (category, count) in counts {
            let percentage = if stats.total_documents > 0 {
                (*count as f64 / stats.total_documents as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    if !stats.fault_summary.is_empty() {
        println!("Fault Summary:");
        for (kind, count) in &stats.fault_summary {
            println!("  {}: {}", kind, count);
        }
        println!();
    }
}
