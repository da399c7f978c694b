//! Page driver capability
//!
//! The harvester never talks to a browser directly. Every component receives a
//! [`PageDriver`] and uses only the small surface defined here: navigation,
//! script execution, element lookup and browsing-context management. Waiting
//! for page conditions is built on top of that surface in [`wait`].
//!
//! Two drivers ship with the crate:
//! - [`HttpDriver`]: fetches pages over HTTP and queries the static HTML
//! - [`MemoryDriver`]: serves an in-memory site, including infinite-scroll
//!   listings, for offline replays

mod http;
mod memory;
mod snapshot;
pub mod wait;

pub use http::{build_http_client, HttpDriver};
pub use memory::MemoryDriver;
pub use snapshot::select_elements;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Script that scrolls the current page to its bottom edge
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Builds a script that removes every element matching `selector`
pub fn remove_elements_script(selector: &str) -> String {
    format!(
        "document.querySelectorAll({:?}).forEach(function (el) {{ el.remove(); }});",
        selector
    )
}

/// Errors reported by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Invalid selector: '{0}'")]
    InvalidSelector(String),

    #[error("Unknown browsing context {0}")]
    UnknownContext(ContextHandle),

    #[error("No page loaded in browsing context {0}")]
    NoPage(ContextHandle),

    #[error("Script failed: {0}")]
    Script(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DriverError {
    /// Returns true if the error means the browser session itself is unusable
    ///
    /// Navigation and HTTP failures concern one page; context and selector
    /// failures affect every later page as well.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector(_) | Self::UnknownContext(_) | Self::NoPage(_)
        )
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Identifies one browsing context (tab) of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextHandle(pub u64);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of one element found on the current page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementHandle {
    /// Whitespace-collapsed text content
    pub text: String,

    /// Absolute link target: the element's own `href` or its first descendant link's
    pub href: Option<String>,

    /// Raw attributes of the element
    pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Browser-automation capability consumed by the harvester
///
/// Every call completes (or fails) before returning; none of them waits for
/// page conditions on its own.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads `url` in the current context
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Executes a script in the current context
    async fn run_script(&mut self, script: &str) -> DriverResult<()>;

    /// Returns every element of the current page matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    /// Returns the first element matching `selector`, if any
    async fn find_one(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// Opens a new, empty browsing context without switching to it
    async fn open_context(&mut self) -> DriverResult<ContextHandle>;

    /// Makes `handle` the current context
    async fn switch_context(&mut self, handle: ContextHandle) -> DriverResult<()>;

    /// Closes `handle`; the caller must switch to another context before using the driver again
    async fn close_context(&mut self, handle: ContextHandle) -> DriverResult<()>;

    /// Returns the current context
    fn current_context(&self) -> ContextHandle;

    /// Number of contexts currently open
    fn open_contexts(&self) -> usize;
}
