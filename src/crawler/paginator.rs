//! Infinite-scroll list reveal
//!
//! A category listing shows a first batch of items and loads more as the page
//! is scrolled. The paginator scrolls and re-measures until the item count
//! stops changing or the scroll cap is reached, whichever comes first.

use crate::config::{CrawlTiming, SelectorConfig};
use crate::crawler::fault::{CrawlFailure, CrawlFault};
use crate::driver::wait::wait_for_count_change;
use crate::driver::{remove_elements_script, ElementHandle, PageDriver, SCROLL_TO_BOTTOM};
use crate::state::CrawlState;

/// One revealed listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    /// Absolute URL of the item's detail page
    pub detail_url: String,

    /// Text of the listing entry
    pub label: String,
}

/// Result of revealing one listing
#[derive(Debug, Clone)]
pub struct Reveal {
    /// Items in listing order
    pub items: Vec<ItemHandle>,

    /// Number of scroll commands issued
    pub scrolls: u32,

    /// True if the list stopped growing, false if the scroll cap cut it short
    pub fully_loaded: bool,
}

/// Reveals every item of an infinite-scroll listing
pub struct ScrollPaginator<'a> {
    selectors: &'a SelectorConfig,
    timing: CrawlTiming,
}

impl<'a> ScrollPaginator<'a> {
    pub fn new(selectors: &'a SelectorConfig, timing: CrawlTiming) -> Self {
        Self { selectors, timing }
    }

    /// Navigates to `category_url` and reveals its items
    ///
    /// # Loop
    ///
    /// 1. Locate the list container (a missing container abandons the category)
    ///    and measure the item count (an empty list is an empty reveal)
    /// 2. Stop if the measurement counter exceeds `scroll_cap`
    /// 3. Dismiss the overlay, scroll to the bottom, wait for the count to change
    /// 4. Dismiss the overlay again and re-measure
    /// 5. Stop if the count did not change, otherwise go to 2
    ///
    /// # Returns
    ///
    /// * `Ok(Reveal)` - The revealed items, possibly a partial or empty list
    /// * `Err(CrawlFailure::Category)` - The listing could not be used
    /// * `Err(CrawlFailure::Fatal)` - The driver session failed
    pub async fn reveal<D>(
        &self,
        driver: &mut D,
        category_url: &str,
        scroll_cap: u32,
    ) -> Result<Reveal, CrawlFailure>
    where
        D: PageDriver + ?Sized,
    {
        let list_selector = self.selectors.list.as_str();
        let item_selector = self.selectors.item.as_str();

        driver
            .navigate(category_url)
            .await
            .map_err(|e| CrawlFailure::from_driver(category_url, e))?;

        let container = driver
            .find_one(list_selector)
            .await
            .map_err(|e| CrawlFailure::from_driver(category_url, e))?;

        if container.is_none() {
            return Err(CrawlFault::PaginationUnavailable {
                url: category_url.to_string(),
                selector: list_selector.to_string(),
            }
            .into());
        }

        let mut elements = driver
            .find_all(item_selector)
            .await
            .map_err(|e| CrawlFailure::from_driver(category_url, e))?;

        if elements.is_empty() {
            tracing::info!("Listing {} has no items", category_url);
            return Ok(Reveal {
                items: Vec::new(),
                scrolls: 0,
                fully_loaded: true,
            });
        }

        let mut state = CrawlState::new(elements.len());
        let mut scrolls = 0;

        let fully_loaded = loop {
            if state.exceeds(scroll_cap) {
                tracing::debug!(
                    "Scroll cap {} reached on {} with {} items",
                    scroll_cap,
                    category_url,
                    state.last_count
                );
                break false;
            }

            self.dismiss_overlay(driver, category_url).await?;
            driver
                .run_script(SCROLL_TO_BOTTOM)
                .await
                .map_err(|e| CrawlFailure::from_driver(category_url, e))?;
            scrolls += 1;

            wait_for_count_change(
                &*driver,
                item_selector,
                state.last_count,
                self.timing.settle,
                self.timing.poll_interval,
            )
            .await
            .map_err(|e| CrawlFailure::from_driver(category_url, e))?;

            self.dismiss_overlay(driver, category_url).await?;
            elements = driver
                .find_all(item_selector)
                .await
                .map_err(|e| CrawlFailure::from_driver(category_url, e))?;

            if !state.observe(elements.len()) {
                break true;
            }
        };

        tracing::debug!(
            "Revealed {} items on {} after {} scrolls (measurements: {})",
            elements.len(),
            category_url,
            scrolls,
            state.iterations
        );

        Ok(Reveal {
            items: to_items(elements, category_url),
            scrolls,
            fully_loaded,
        })
    }

    /// Removes the interstitial overlay if it is present
    ///
    /// A missing overlay, or a script failure while removing it, is not an error.
    async fn dismiss_overlay<D>(&self, driver: &mut D, page_url: &str) -> Result<(), CrawlFailure>
    where
        D: PageDriver + ?Sized,
    {
        let overlay = self.selectors.overlay.as_str();

        match driver.find_one(overlay).await {
            Ok(Some(_)) => {
                tracing::debug!("Dismissing overlay '{}' on {}", overlay, page_url);
                if let Err(e) = driver.run_script(&remove_elements_script(overlay)).await {
                    tracing::warn!("Failed to dismiss overlay on {}: {}", page_url, e);
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) if e.is_session_failure() => Err(CrawlFailure::session(e)),
            Err(e) => {
                tracing::warn!("Overlay lookup failed on {}: {}", page_url, e);
                Ok(())
            }
        }
    }
}

/// Turns listing entries into item handles, skipping entries without a link
fn to_items(elements: Vec<ElementHandle>, category_url: &str) -> Vec<ItemHandle> {
    elements
        .into_iter()
        .filter_map(|element| match element.href {
            Some(detail_url) => Some(ItemHandle {
                detail_url,
                label: element.text,
            }),
            None => {
                tracing::warn!(
                    "Skipping listing entry without a link on {}: '{}'",
                    category_url,
                    element.text
                );
                None
            }
        })
        .collect()
}
