//! Hub-Harvester: an incremental document harvester for infinite-scroll content hubs
//!
//! This crate walks the category listings of a content hub, reveals every item
//! by scrolling, extracts one document per detail page (inline "native" content
//! or a pointer to an attached file) and stops either when the listings are
//! exhausted, when a configured capacity is reached, or when it meets the
//! boundary document left behind by a previous run.

pub mod config;
pub mod crawler;
pub mod document;
pub mod driver;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Hub-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session failure: {0}")]
    Session(#[source] driver::DriverError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),

    #[error("Unknown source type '{0}' (expected 'native' or 'file')")]
    UnknownSourceType(String),
}

/// Result type alias for Hub-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SourceType};
pub use crawler::{run_harvest, CategoryCrawler, CrawlOutcome};
pub use document::{fingerprint, Document, Fingerprint};
pub use driver::{HttpDriver, MemoryDriver, PageDriver};
pub use state::StopReason;
