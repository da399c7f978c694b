//! Harvested document records
//!
//! A [`Document`] is one record produced by the harvester. Its two public
//! constructors mirror the two detail-page layouts, so a document always
//! carries exactly one of `text` (native content) or `abstract_text` (summary of
//! an attached file).

mod date;
mod fingerprint;

pub use date::parse_pub_date;
pub use fingerprint::{fingerprint, Fingerprint};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Metadata key holding the category label
pub const META_CATEGORY: &str = "category";

/// Metadata key holding the hub page a file document was found on
pub const META_SOURCE_DETAIL_LINK: &str = "sourceDetailLink";

/// One harvested record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub abstract_text: Option<String>,
    pub text: Option<String>,
    pub web_link: String,
    /// Reserved for a later download stage; the harvester never sets it
    pub local_link: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub load_date: DateTime<Utc>,
}

impl Document {
    /// Builds a document whose content lives on the hub page itself
    pub fn native(
        title: impl Into<String>,
        text: impl Into<String>,
        detail_url: impl Into<String>,
        category: impl Into<String>,
        pub_date: Option<DateTime<Utc>>,
        load_date: DateTime<Utc>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_CATEGORY.to_string(), category.into());

        Self {
            title: title.into(),
            abstract_text: None,
            text: Some(text.into()),
            web_link: detail_url.into(),
            local_link: None,
            metadata,
            pub_date,
            load_date,
        }
    }

    /// Builds a document that points at an externally hosted file
    ///
    /// The hub page's body becomes the abstract and the file URL becomes the
    /// web link; the hub page itself is kept under `sourceDetailLink`.
    pub fn file(
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        file_url: impl Into<String>,
        detail_url: impl Into<String>,
        category: impl Into<String>,
        pub_date: Option<DateTime<Utc>>,
        load_date: DateTime<Utc>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_CATEGORY.to_string(), category.into());
        metadata.insert(META_SOURCE_DETAIL_LINK.to_string(), detail_url.into());

        Self {
            title: title.into(),
            abstract_text: Some(abstract_text.into()),
            text: None,
            web_link: file_url.into(),
            local_link: None,
            metadata,
            pub_date,
            load_date,
        }
    }

    /// Returns the category label the document was harvested from
    pub fn category(&self) -> Option<&str> {
        self.metadata.get(META_CATEGORY).map(String::as_str)
    }

    /// Returns the hub page of a file document
    pub fn source_detail_link(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE_DETAIL_LINK).map(String::as_str)
    }

    /// Returns whichever content field is populated
    pub fn content(&self) -> &str {
        self.text
            .as_deref()
            .or(self.abstract_text.as_deref())
            .unwrap_or("")
    }

    /// Returns true if the document points at an external file
    pub fn is_file(&self) -> bool {
        self.abstract_text.is_some()
    }

    /// One-line description used when logging accepted documents
    pub fn log_line(&self) -> String {
        format!(
            "Find document | name: {} | link to web: {} | publication date: {}",
            self.title,
            self.web_link,
            self.pub_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        )
    }
}
