//! In-memory page driver
//!
//! Serves a fixed set of pages without any network access. Listing pages
//! behave like infinite-scroll lists: navigation shows the first batch of
//! items and every scroll-to-bottom script reveals the next batch.

use super::snapshot::select_elements;
use super::{ContextHandle, DriverError, DriverResult, ElementHandle, PageDriver, SCROLL_TO_BOTTOM};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use url::Url;

#[derive(Debug, Clone)]
enum MemoryPage {
    Static(String),
    Listing {
        items: Vec<String>,
        batch: usize,
        banner: String,
    },
}

#[derive(Debug, Clone, Default)]
struct Tab {
    url: Option<String>,
    revealed: usize,
}

/// Page driver backed by an in-memory site
#[derive(Debug)]
pub struct MemoryDriver {
    pages: HashMap<String, MemoryPage>,
    contexts: BTreeMap<ContextHandle, Tab>,
    current: ContextHandle,
    next_handle: u64,
    navigations: Vec<String>,
    scripts: Vec<String>,
}

impl MemoryDriver {
    /// Creates a driver with one open, empty context
    pub fn new() -> Self {
        let initial = ContextHandle(0);
        let mut contexts = BTreeMap::new();
        contexts.insert(initial, Tab::default());

        Self {
            pages: HashMap::new(),
            contexts,
            current: initial,
            next_handle: 1,
            navigations: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Adds a static page
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), MemoryPage::Static(html.into()));
        self
    }

    /// Adds an infinite-scroll listing revealing `batch` items per scroll
    ///
    /// Each entry of `items` is the HTML of one list entry.
    pub fn with_listing(mut self, url: impl Into<String>, items: Vec<String>, batch: usize) -> Self {
        self.pages.insert(
            url.into(),
            MemoryPage::Listing {
                items,
                batch: batch.max(1),
                banner: String::new(),
            },
        );
        self
    }

    /// Adds markup rendered above the items of an existing listing (e.g. a cookie banner)
    pub fn with_listing_banner(mut self, url: &str, html: impl Into<String>) -> Self {
        if let Some(MemoryPage::Listing { banner, .. }) = self.pages.get_mut(url) {
            *banner = html.into();
        }
        self
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Scripts executed, in order
    pub fn executed_scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Number of scroll-to-bottom scripts executed
    pub fn scroll_count(&self) -> usize {
        self.scripts.iter().filter(|s| s.as_str() == SCROLL_TO_BOTTOM).count()
    }

    fn tab(&self) -> DriverResult<&Tab> {
        self.contexts
            .get(&self.current)
            .ok_or(DriverError::UnknownContext(self.current))
    }

    fn tab_mut(&mut self) -> DriverResult<&mut Tab> {
        let current = self.current;
        self.contexts
            .get_mut(&current)
            .ok_or(DriverError::UnknownContext(current))
    }

    fn render(&self, tab: &Tab, url: &str) -> String {
        match self.pages.get(url) {
            Some(MemoryPage::Static(html)) => html.clone(),
            Some(MemoryPage::Listing { items, banner, .. }) => {
                let shown = &items[..tab.revealed.min(items.len())];
                format!(
                    "<html><body>{}<ul class=\"listing\">{}</ul></body></html>",
                    banner,
                    shown.concat()
                )
            }
            None => String::new(),
        }
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for MemoryDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let revealed = match self.pages.get(url) {
            Some(MemoryPage::Static(_)) => 0,
            Some(MemoryPage::Listing { items, batch, .. }) => (*batch).min(items.len()),
            None => {
                return Err(DriverError::Navigation {
                    url: url.to_string(),
                    message: "HTTP 404".to_string(),
                })
            }
        };

        let tab = self.tab_mut()?;
        tab.url = Some(url.to_string());
        tab.revealed = revealed;
        self.navigations.push(url.to_string());
        Ok(())
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<()> {
        let url = self.tab()?.url.clone();
        self.scripts.push(script.to_string());

        if script != SCROLL_TO_BOTTOM {
            return Ok(());
        }

        let grow = match url.as_deref().and_then(|u| self.pages.get(u)) {
            Some(MemoryPage::Listing { items, batch, .. }) => Some((*batch, items.len())),
            _ => None,
        };

        if let Some((batch, total)) = grow {
            let tab = self.tab_mut()?;
            tab.revealed = (tab.revealed + batch).min(total);
        }

        Ok(())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let tab = self.tab()?;
        let url = tab.url.as_deref().ok_or(DriverError::NoPage(self.current))?;
        let base = Url::parse(url).ok();
        let html = self.render(tab, url);
        select_elements(&html, base.as_ref(), selector)
    }

    async fn open_context(&mut self) -> DriverResult<ContextHandle> {
        let handle = ContextHandle(self.next_handle);
        self.next_handle += 1;
        self.contexts.insert(handle, Tab::default());
        Ok(handle)
    }

    async fn switch_context(&mut self, handle: ContextHandle) -> DriverResult<()> {
        if !self.contexts.contains_key(&handle) {
            return Err(DriverError::UnknownContext(handle));
        }
        self.current = handle;
        Ok(())
    }

    async fn close_context(&mut self, handle: ContextHandle) -> DriverResult<()> {
        self.contexts
            .remove(&handle)
            .map(|_| ())
            .ok_or(DriverError::UnknownContext(handle))
    }

    fn current_context(&self) -> ContextHandle {
        self.current
    }

    fn open_contexts(&self) -> usize {
        self.contexts.len()
    }
}
