//! Failure classification for the crawl loop
//!
//! | Condition | Scope | Disposition |
//! |-----------|-------|-------------|
//! | Item list not found | category | abandon category, continue |
//! | Title landmark not found in time | category | abandon category, continue |
//! | Navigation / HTTP failure | category | abandon category, continue |
//! | Context or selector failure | crawl | abort, keep partial result |

use crate::driver::DriverError;
use crate::HarvestError;
use std::fmt;
use thiserror::Error;

/// A recoverable failure that abandons the current category
#[derive(Debug, Error)]
pub enum CrawlFault {
    #[error("Item list not found on {url} (selector '{selector}')")]
    PaginationUnavailable { url: String, selector: String },

    #[error("Timed out after {waited_ms}ms waiting for '{selector}' on {url}")]
    LoadTimeout {
        url: String,
        selector: String,
        waited_ms: u64,
    },

    #[error("Page failure on {url}: {source}")]
    Driver {
        url: String,
        #[source]
        source: DriverError,
    },
}

impl CrawlFault {
    /// Short machine-readable name, used when persisting faults
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaginationUnavailable { .. } => "pagination_unavailable",
            Self::LoadTimeout { .. } => "load_timeout",
            Self::Driver { .. } => "driver_error",
        }
    }

    /// The page the fault occurred on
    pub fn url(&self) -> &str {
        match self {
            Self::PaginationUnavailable { url, .. }
            | Self::LoadTimeout { url, .. }
            | Self::Driver { url, .. } => url,
        }
    }
}

/// A fault together with the category it abandoned
#[derive(Debug)]
pub struct CategoryFault {
    pub category: String,
    pub fault: CrawlFault,
}

impl fmt::Display for CategoryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category '{}': {}", self.category, self.fault)
    }
}

/// Failure raised by a crawl step, split by scope
#[derive(Debug)]
pub enum CrawlFailure {
    /// Abandon the current category and continue with the next one
    Category(CrawlFault),

    /// Abort the whole crawl
    Fatal(HarvestError),
}

impl CrawlFailure {
    /// Classifies a driver error raised while working on `url`
    pub fn from_driver(url: &str, error: DriverError) -> Self {
        if error.is_session_failure() {
            Self::Fatal(HarvestError::Session(error))
        } else {
            Self::Category(CrawlFault::Driver {
                url: url.to_string(),
                source: error,
            })
        }
    }

    /// Wraps a failure of browsing-context management
    pub fn session(error: DriverError) -> Self {
        Self::Fatal(HarvestError::Session(error))
    }
}

impl From<CrawlFault> for CrawlFailure {
    fn from(fault: CrawlFault) -> Self {
        Self::Category(fault)
    }
}

impl fmt::Display for CrawlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(fault) => write!(f, "{}", fault),
            Self::Fatal(error) => write!(f, "fatal: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ContextHandle;

    #[test]
    fn test_navigation_error_is_category_scoped() {
        let failure = CrawlFailure::from_driver(
            "https://hub.example/a",
            DriverError::Navigation {
                url: "https://hub.example/a".to_string(),
                message: "HTTP 500".to_string(),
            },
        );
        match failure {
            CrawlFailure::Category(fault) => {
                assert_eq!(fault.kind(), "driver_error");
                assert_eq!(fault.url(), "https://hub.example/a");
            }
            CrawlFailure::Fatal(e) => panic!("expected category fault, got {}", e),
        }
    }

    #[test]
    fn test_http_error_is_category_scoped() {
        let http_error = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();

        let failure = CrawlFailure::from_driver("https://hub.example/a", DriverError::Http(http_error));

        match failure {
            CrawlFailure::Category(CrawlFault::Driver { url, source }) => {
                assert_eq!(url, "https://hub.example/a");
                assert!(matches!(source, DriverError::Http(_)));
            }
            other => panic!("expected category fault, got {}", other),
        }
    }

    #[test]
    fn test_context_error_is_fatal() {
        let failure = CrawlFailure::from_driver(
            "https://hub.example/a",
            DriverError::UnknownContext(ContextHandle(4)),
        );
        assert!(matches!(failure, CrawlFailure::Fatal(HarvestError::Session(_))));
    }

    #[test]
    fn test_fault_kinds() {
        let timeout = CrawlFault::LoadTimeout {
            url: "u".to_string(),
            selector: "h1".to_string(),
            waited_ms: 20_000,
        };
        assert_eq!(timeout.kind(), "load_timeout");
        assert!(timeout.to_string().contains("20000ms"));

        let missing = CrawlFault::PaginationUnavailable {
            url: "u".to_string(),
            selector: "li".to_string(),
        };
        assert_eq!(missing.kind(), "pagination_unavailable");
    }
}
