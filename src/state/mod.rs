//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: per-category scroll bookkeeping, discarded once the listing is revealed
//! - `TerminationState`: the crawl-wide accumulator and its stopping bounds
//! - `StopReason`: why a crawl ended

mod crawl_state;
mod termination;

// Re-export main types
pub use crawl_state::CrawlState;
pub use termination::{StopReason, TerminationState};
