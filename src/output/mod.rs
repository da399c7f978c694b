//! Output module for generating harvest summaries and reports
//!
//! This module handles:
//! - Loading a run back from the store as a [`HarvestSummary`]
//! - Generating markdown summaries of harvest runs
//! - Printing store-wide statistics

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use summary::{HarvestSummary, OutputError, OutputResult};

use crate::storage::Storage;
use chrono::{DateTime, Utc};

/// Generates a harvest summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing harvest data
/// * `run_id` - The run to summarize; the most recent run when `None`
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Successfully generated summary
/// * `Err(OutputError)` - No such run, or the store could not be read
pub fn generate_summary(storage: &dyn Storage, run_id: Option<i64>) -> OutputResult<HarvestSummary> {
    let run = match run_id {
        Some(id) => storage.get_run(id)?,
        None => storage.get_latest_run()?.ok_or(OutputError::NoRuns)?,
    };

    let duration_seconds = match (
        run.started_at.parse::<DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    Ok(HarvestSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        stop_reason: run.stop_reason.map(|r| r.to_db_string().to_string()),
        config_hash: run.config_hash,
        documents: storage.get_documents(run.id)?,
        faults: storage.get_faults(run.id)?,
    })
}
