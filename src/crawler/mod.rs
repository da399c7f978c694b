//! Crawler module for revealing listings and harvesting documents
//!
//! This module contains the core harvesting logic, including:
//! - Infinite-scroll pagination of category listings
//! - Detail-page extraction for native and file layouts
//! - Admission control (boundary and capacity stops)
//! - Overall crawl coordination and persisted runs

mod coordinator;
mod extractor;
mod fault;
mod gate;
mod paginator;
mod session;

pub use coordinator::{CategoryCrawler, CrawlOutcome};
pub use extractor::DocumentExtractor;
pub use fault::{CategoryFault, CrawlFailure, CrawlFault};
pub use gate::{Admission, DeduplicationGate};
pub use paginator::{ItemHandle, Reveal, ScrollPaginator};
pub use session::{HarvestReport, HarvestSession};

use crate::config::Config;
use crate::document::Document;
use crate::driver::PageDriver;

/// Runs a complete crawl
///
/// This is the main entry point for a crawl. It will:
/// 1. Walk every configured category in order
/// 2. Reveal each listing by scrolling, up to the scroll cap
/// 3. Extract every revealed item in its own browsing context
/// 4. Stop at the boundary document, at capacity, or when every listing is exhausted
///
/// # Arguments
///
/// * `driver` - The page driver to crawl with
/// * `config` - The harvester configuration
/// * `boundary` - The previous run's boundary document, if any
///
/// # Returns
///
/// Every document accepted before the crawl stopped, together with the stop
/// reason, abandoned categories and the fatal error, if one occurred.
///
/// # Example
///
/// ```no_run
/// use hub_harvester::config::load_config;
/// use hub_harvester::crawler::run_harvest;
/// use hub_harvester::driver::HttpDriver;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let mut driver = HttpDriver::from_user_agent(&config.user_agent)?;
/// let outcome = run_harvest(&mut driver, &config, None).await;
/// println!("{} documents", outcome.documents.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest<D>(driver: &mut D, config: &Config, boundary: Option<&Document>) -> CrawlOutcome
where
    D: PageDriver + ?Sized,
{
    let contexts = driver.open_contexts();
    let outcome = CategoryCrawler::new(driver, config).run(boundary).await;

    if driver.open_contexts() != contexts {
        tracing::warn!(
            "Browsing contexts leaked: {} open before the crawl, {} after",
            contexts,
            driver.open_contexts()
        );
    }

    outcome
}
