use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;

/// Main configuration structure for Hub-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    /// Categories in crawl order
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// Layout of a hub's detail pages
///
/// `Native` pages carry the document body inline; `File` pages carry a short
/// summary plus a download control pointing at the actual document.
/// Parsing ignores case, so `NATIVE` and `native` name the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SourceType {
    Native,
    File,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::File => "file",
        }
    }
}

impl FromStr for SourceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "file" => Ok(Self::File),
            _ => Err(ConfigError::UnknownSourceType(s.to_string())),
        }
    }
}

impl TryFrom<String> for SourceType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Default layout for every category that does not override it
    #[serde(rename = "source-type")]
    pub source_type: SourceType,

    /// Maximum number of list measurements per category before a partial
    /// listing is accepted
    #[serde(rename = "scroll-cap")]
    pub scroll_cap: u32,

    /// Maximum number of documents accepted per crawl
    #[serde(rename = "max-count")]
    pub max_count: usize,

    /// How long to wait for new items after a scroll (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// How long to wait for a detail page's title landmark (milliseconds)
    #[serde(rename = "element-timeout-ms", default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Polling interval used by every condition-based wait (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_element_timeout_ms() -> u64 {
    20_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl CrawlerConfig {
    /// Returns the wait durations derived from this configuration
    pub fn timing(&self) -> CrawlTiming {
        CrawlTiming {
            settle: Duration::from_millis(self.settle_ms),
            element_timeout: Duration::from_millis(self.element_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Bounded waits used while driving pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlTiming {
    pub settle: Duration,
    pub element_timeout: Duration,
    pub poll_interval: Duration,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identity as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// CSS selectors for every page landmark the harvester reads
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Container of a category listing; a page without it has an unsupported layout
    #[serde(default = "default_list_selector")]
    pub list: String,

    /// One entry of a category listing
    #[serde(default = "default_item_selector")]
    pub item: String,

    /// Title landmark of a detail page; its presence means the page loaded
    #[serde(default = "default_title_selector")]
    pub title: String,

    /// Publish date of a detail page
    #[serde(default = "default_date_selector")]
    pub date: String,

    /// Body block of a detail page
    #[serde(default = "default_body_selector")]
    pub body: String,

    /// Download control of a file-type detail page
    #[serde(default = "default_download_selector")]
    pub download: String,

    /// Interstitial overlay (cookie banner, newsletter prompt) hiding the listing
    #[serde(default = "default_overlay_selector")]
    pub overlay: String,
}

fn default_list_selector() -> String {
    "ul".to_string()
}

fn default_item_selector() -> String {
    "li.card-products".to_string()
}

fn default_title_selector() -> String {
    "h1".to_string()
}

fn default_date_selector() -> String {
    "time".to_string()
}

fn default_body_selector() -> String {
    ".entry-content".to_string()
}

fn default_download_selector() -> String {
    "a.download-link".to_string()
}

fn default_overlay_selector() -> String {
    "#onetrust-banner-sdk".to_string()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            list: default_list_selector(),
            item: default_item_selector(),
            title: default_title_selector(),
            date: default_date_selector(),
            body: default_body_selector(),
            download: default_download_selector(),
            overlay: default_overlay_selector(),
        }
    }
}

impl SelectorConfig {
    /// Returns every selector paired with its config key
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("list", self.list.as_str()),
            ("item", self.item.as_str()),
            ("title", self.title.as_str()),
            ("date", self.date.as_str()),
            ("body", self.body.as_str()),
            ("download", self.download.as_str()),
            ("overlay", self.overlay.as_str()),
        ]
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite run store
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// One listing page of the hub
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Human-readable label, copied into every document's metadata
    pub label: String,

    /// URL of the infinite-scroll listing
    pub url: String,

    /// Overrides `crawler.source-type` for this category
    #[serde(default, rename = "source-type")]
    pub source_type: Option<SourceType>,
}

impl CategoryEntry {
    /// Returns the layout to use for this category
    pub fn effective_source_type(&self, default: SourceType) -> SourceType {
        self.source_type.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_from_str() {
        assert_eq!("native".parse::<SourceType>().unwrap(), SourceType::Native);
        assert_eq!("NATIVE".parse::<SourceType>().unwrap(), SourceType::Native);
        assert_eq!(" File ".parse::<SourceType>().unwrap(), SourceType::File);
        assert!(matches!(
            "pdf".parse::<SourceType>(),
            Err(ConfigError::UnknownSourceType(s)) if s == "pdf"
        ));
    }

    #[test]
    fn test_effective_source_type() {
        let entry = CategoryEntry {
            label: "Reports".to_string(),
            url: "https://hub.example/reports/".to_string(),
            source_type: Some(SourceType::File),
        };
        assert_eq!(entry.effective_source_type(SourceType::Native), SourceType::File);

        let entry = CategoryEntry { source_type: None, ..entry };
        assert_eq!(entry.effective_source_type(SourceType::Native), SourceType::Native);
    }

    #[test]
    fn test_default_selectors() {
        let selectors = SelectorConfig::default();
        assert_eq!(selectors.item, "li.card-products");
        assert_eq!(selectors.list, "ul");
        assert_eq!(selectors.entries().len(), 7);
    }
}
