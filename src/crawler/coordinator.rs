//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the crawl loop that drives every configured category:
//! - Reveal the category listing with the [`ScrollPaginator`]
//! - Extract each revealed item with the [`DocumentExtractor`]
//! - Offer each document to the [`DeduplicationGate`]
//! - Stop on the gate's signal, skip faulty categories, abort on fatal errors

use crate::config::{CategoryEntry, Config};
use crate::crawler::extractor::DocumentExtractor;
use crate::crawler::fault::{CategoryFault, CrawlFailure};
use crate::crawler::gate::{Admission, DeduplicationGate};
use crate::crawler::paginator::ScrollPaginator;
use crate::document::Document;
use crate::driver::PageDriver;
use crate::state::{StopReason, TerminationState};
use crate::storage::RunStatus;
use crate::HarvestError;

/// Everything a crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Accepted documents, in acceptance order
    pub documents: Vec<Document>,

    /// Why the crawl stopped; `None` only when a fatal error aborted it
    pub stop: Option<StopReason>,

    /// Categories abandoned along the way
    pub faults: Vec<CategoryFault>,

    /// The error that aborted the crawl, if any
    pub fatal: Option<HarvestError>,
}

impl CrawlOutcome {
    /// Returns true if the crawl was aborted by a fatal error
    pub fn is_aborted(&self) -> bool {
        self.fatal.is_some()
    }

    /// Final status of the run that produced this outcome
    pub fn run_status(&self) -> RunStatus {
        if self.is_aborted() {
            RunStatus::Failed
        } else if !self.faults.is_empty() {
            RunStatus::Partial
        } else {
            RunStatus::Completed
        }
    }
}

/// Drives the configured categories in order
pub struct CategoryCrawler<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    config: &'a Config,
    gate: DeduplicationGate,
}

impl<'a, D: PageDriver + ?Sized> CategoryCrawler<'a, D> {
    pub fn new(driver: &'a mut D, config: &'a Config) -> Self {
        Self {
            driver,
            config,
            gate: DeduplicationGate::new(),
        }
    }

    /// Replaces the default admission gate
    pub fn with_gate(mut self, gate: DeduplicationGate) -> Self {
        self.gate = gate;
        self
    }

    /// Runs the crawl
    ///
    /// # Arguments
    ///
    /// * `boundary` - The previous run's boundary document; reaching it stops the crawl
    ///
    /// # Returns
    ///
    /// The collected documents together with the stop reason, the abandoned
    /// categories and the fatal error, if any. Never fails: whatever was
    /// accepted before a failure is kept.
    pub async fn run(&mut self, boundary: Option<&Document>) -> CrawlOutcome {
        let config: &'a Config = self.config;
        let timing = config.crawler.timing();
        let paginator = ScrollPaginator::new(&config.selectors, timing);
        let extractor = DocumentExtractor::new(&config.selectors, timing);

        let boundary = boundary.map(|doc| self.gate.fingerprint_of(doc));
        if let Some(fp) = &boundary {
            tracing::info!("Incremental crawl, boundary fingerprint {}", fp);
        }

        let mut state = TerminationState::new(boundary, config.crawler.max_count);
        let mut faults = Vec::new();

        tracing::info!(
            "Starting crawl of {} categories (max {} documents, scroll cap {})",
            config.categories.len(),
            config.crawler.max_count,
            config.crawler.scroll_cap
        );

        for category in &config.categories {
            match self
                .crawl_category(category, &paginator, &extractor, &mut state)
                .await
            {
                Ok(None) => {}
                Ok(Some(reason)) => {
                    tracing::info!("Crawl stopped in category '{}': {}", category.label, reason);
                    return finish(state, Some(reason), faults, None);
                }
                Err(CrawlFailure::Category(fault)) => {
                    tracing::warn!("Abandoning category '{}': {}", category.label, fault);
                    faults.push(CategoryFault {
                        category: category.label.clone(),
                        fault,
                    });
                }
                Err(CrawlFailure::Fatal(error)) => {
                    tracing::error!("Crawl aborted in category '{}': {}", category.label, error);
                    return finish(state, None, faults, Some(error));
                }
            }
        }

        finish(state, Some(StopReason::Exhausted), faults, None)
    }

    /// Crawls one category
    ///
    /// Returns the stop reason if the gate ended the crawl.
    async fn crawl_category(
        &mut self,
        category: &CategoryEntry,
        paginator: &ScrollPaginator<'_>,
        extractor: &DocumentExtractor<'_>,
        state: &mut TerminationState,
    ) -> Result<Option<StopReason>, CrawlFailure> {
        let source_type = category.effective_source_type(self.config.crawler.source_type);
        tracing::info!(
            "Crawling category '{}' ({}) at {}",
            category.label,
            source_type,
            category.url
        );

        let reveal = paginator
            .reveal(&mut *self.driver, &category.url, self.config.crawler.scroll_cap)
            .await?;

        tracing::info!(
            "Processing list of {} items{}",
            reveal.items.len(),
            if reveal.fully_loaded { "" } else { " (scroll cap reached)" }
        );

        for item in &reveal.items {
            let doc = extractor
                .extract(&mut *self.driver, source_type, item, &category.label)
                .await?;

            if let Admission::Stop(reason) = self.gate.admit(state, doc) {
                return Ok(Some(reason));
            }
        }

        Ok(None)
    }
}

fn finish(
    state: TerminationState,
    stop: Option<StopReason>,
    faults: Vec<CategoryFault>,
    fatal: Option<HarvestError>,
) -> CrawlOutcome {
    let documents = state.into_documents();
    tracing::info!(
        "Crawl finished: {} documents, {} abandoned categories, stop: {}",
        documents.len(),
        faults.len(),
        stop.map(|s| s.to_db_string()).unwrap_or("aborted")
    );

    CrawlOutcome {
        documents,
        stop,
        faults,
        fatal,
    }
}
