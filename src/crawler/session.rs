//! Persisted harvest runs
//!
//! A session wraps one crawl with the run store: it loads the boundary left by
//! the previous run, records the new run, stores what the crawl produced and
//! writes the markdown summary.

use crate::config::Config;
use crate::crawler::coordinator::CrawlOutcome;
use crate::crawler::run_harvest;
use crate::driver::PageDriver;
use crate::output::{generate_markdown_summary, generate_summary};
use crate::storage::{open_storage, SqliteStorage, Storage};
use crate::HarvestError;
use std::path::Path;

/// Result of a persisted harvest
#[derive(Debug)]
pub struct HarvestReport {
    /// ID of the run in the store
    pub run_id: i64,

    /// What the crawl produced
    pub outcome: CrawlOutcome,

    /// Set when the outcome could not be stored or the summary not written
    pub persist_error: Option<HarvestError>,
}

impl HarvestReport {
    /// Returns true if the outcome and its summary were both written
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// One harvest run backed by a run store
pub struct HarvestSession<S: Storage> {
    config: Config,
    config_hash: String,
    storage: S,
    fresh: bool,
}

impl HarvestSession<SqliteStorage> {
    /// Opens the run store named in the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash of the configuration file, recorded with the run
    /// * `fresh` - Ignore the previous run's boundary document
    pub fn open(config: Config, config_hash: impl Into<String>, fresh: bool) -> Result<Self, HarvestError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Ok(Self::with_storage(config, config_hash, storage, fresh))
    }
}

impl<S: Storage> HarvestSession<S> {
    pub fn with_storage(config: Config, config_hash: impl Into<String>, storage: S, fresh: bool) -> Self {
        Self {
            config,
            config_hash: config_hash.into(),
            storage,
            fresh,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the crawl and persists its outcome
    ///
    /// Once the crawl has started its outcome is always returned. A fatal
    /// crawl error is stored as a `failed` run and carried in the outcome; a
    /// failure to store the run or write the summary is carried in
    /// `persist_error`.
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - The crawl ran
    /// * `Err(HarvestError)` - The boundary could not be loaded or the run not created
    pub async fn run<D>(&mut self, driver: &mut D) -> Result<HarvestReport, HarvestError>
    where
        D: PageDriver + ?Sized,
    {
        let boundary = if self.fresh {
            tracing::info!("Fresh harvest, ignoring previous runs");
            None
        } else {
            self.storage.load_boundary_document()?
        };

        match &boundary {
            Some(doc) => tracing::info!("Boundary document: '{}' ({})", doc.title, doc.web_link),
            None => tracing::info!("No boundary document, harvesting until exhausted or full"),
        }

        let run_id = self.storage.create_run(&self.config_hash)?;
        tracing::info!("Starting harvest run {}", run_id);

        let outcome = run_harvest(driver, &self.config, boundary.as_ref()).await;

        let persist_error = match self.persist(run_id, &outcome).and_then(|()| self.write_summary(run_id)) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    "Run {} could not be stored ({} documents collected): {}",
                    run_id,
                    outcome.documents.len(),
                    e
                );
                Some(e)
            }
        };

        Ok(HarvestReport {
            run_id,
            outcome,
            persist_error,
        })
    }

    fn persist(&mut self, run_id: i64, outcome: &CrawlOutcome) -> Result<(), HarvestError> {
        self.storage.insert_documents(run_id, &outcome.documents)?;

        for fault in &outcome.faults {
            self.storage.record_fault(
                run_id,
                &fault.category,
                fault.fault.kind(),
                fault.fault.url(),
                &fault.fault.to_string(),
            )?;
        }

        let status = outcome.run_status();
        self.storage.finish_run(
            run_id,
            status,
            outcome.stop,
            outcome.documents.len() as u64,
        )?;

        tracing::info!(
            "Run {} stored as {} with {} documents",
            run_id,
            status.to_db_string(),
            outcome.documents.len()
        );
        Ok(())
    }

    fn write_summary(&self, run_id: i64) -> Result<(), HarvestError> {
        let summary = generate_summary(&self.storage, Some(run_id))?;
        generate_markdown_summary(&summary, Path::new(&self.config.output.summary_path))?;
        tracing::info!("Summary written to {}", self.config.output.summary_path);
        Ok(())
    }
}
