//! Admission control for extracted documents
//!
//! Rules, in order:
//! 1. Boundary: the document matches the previous run's boundary document
//! 2. Capacity: the crawl already holds `max_count` documents
//!
//! A fired rule is recorded in the [`TerminationState`] and repeated for every
//! later document without appending it.

use crate::document::{fingerprint, Document, Fingerprint};
use crate::state::{StopReason, TerminationState};

/// Result of offering a document to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The document was appended
    Accepted,

    /// The crawl must stop; the document was not appended
    Stop(StopReason),
}

/// Decides whether each extracted document is kept or ends the crawl
#[derive(Debug, Clone, Copy)]
pub struct DeduplicationGate {
    fingerprint: fn(&Document) -> Fingerprint,
}

impl DeduplicationGate {
    /// Creates a gate using the default content fingerprint
    pub fn new() -> Self {
        Self::with_fingerprint(fingerprint)
    }

    /// Creates a gate using a custom content-addressing scheme
    pub fn with_fingerprint(fingerprint: fn(&Document) -> Fingerprint) -> Self {
        Self { fingerprint }
    }

    /// Fingerprints `doc` the same way admitted documents are compared
    pub fn fingerprint_of(&self, doc: &Document) -> Fingerprint {
        (self.fingerprint)(doc)
    }

    /// Offers `doc` to the crawl
    ///
    /// # Arguments
    ///
    /// * `state` - The crawl-wide accumulator
    /// * `doc` - The newly extracted document
    ///
    /// # Returns
    ///
    /// * `Admission::Accepted` - `doc` was appended to `state.documents`
    /// * `Admission::Stop(reason)` - A stopping rule fired now or earlier
    pub fn admit(&self, state: &mut TerminationState, doc: Document) -> Admission {
        if let Some(reason) = state.stop {
            return Admission::Stop(reason);
        }

        if let Some(boundary) = &state.boundary {
            if self.fingerprint_of(&doc) == *boundary {
                tracing::info!("Reached boundary document '{}', stopping", doc.title);
                state.stop = Some(StopReason::Boundary);
                return Admission::Stop(StopReason::Boundary);
            }
        }

        if state.is_full() {
            tracing::info!("Reached maximum of {} documents, stopping", state.max_count);
            state.stop = Some(StopReason::Capacity);
            return Admission::Stop(StopReason::Capacity);
        }

        tracing::info!("{}", doc.log_line());
        state.documents.push(doc);
        Admission::Accepted
    }
}

impl Default for DeduplicationGate {
    fn default() -> Self {
        Self::new()
    }
}
