//! Detail-page extraction
//!
//! Every item is opened in its own browsing context so the listing page keeps
//! its scroll position. The context is always closed and the listing context
//! restored before [`DocumentExtractor::extract`] returns.

use crate::config::{CrawlTiming, SelectorConfig, SourceType};
use crate::crawler::fault::{CrawlFailure, CrawlFault};
use crate::crawler::paginator::ItemHandle;
use crate::document::{parse_pub_date, Document};
use crate::driver::wait::{wait_for_element, WaitOutcome};
use crate::driver::{ContextHandle, DriverResult, ElementHandle, PageDriver};
use chrono::{DateTime, Utc};

/// Landmarks read from a detail page, shared by both source types
struct DetailPage {
    title: String,
    pub_date: Option<DateTime<Utc>>,
    body: String,
}

/// Extracts one [`Document`] per detail page
pub struct DocumentExtractor<'a> {
    selectors: &'a SelectorConfig,
    timing: CrawlTiming,
}

impl<'a> DocumentExtractor<'a> {
    pub fn new(selectors: &'a SelectorConfig, timing: CrawlTiming) -> Self {
        Self { selectors, timing }
    }

    /// Extracts the document behind `item`
    ///
    /// # Arguments
    ///
    /// * `driver` - The page driver, positioned on the listing
    /// * `source_type` - Layout of the detail page
    /// * `item` - The listing entry to open
    /// * `category` - Label stored in the document's metadata
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The extracted document
    /// * `Err(CrawlFailure::Category)` - The page could not be loaded or never showed its title
    /// * `Err(CrawlFailure::Fatal)` - A browsing context could not be managed
    pub async fn extract<D>(
        &self,
        driver: &mut D,
        source_type: SourceType,
        item: &ItemHandle,
        category: &str,
    ) -> Result<Document, CrawlFailure>
    where
        D: PageDriver + ?Sized,
    {
        let origin = driver.current_context();
        let detail = driver
            .open_context()
            .await
            .map_err(CrawlFailure::session)?;

        let result = match driver.switch_context(detail).await {
            Ok(()) => self.extract_in_context(driver, source_type, item, category).await,
            Err(e) => Err(CrawlFailure::session(e)),
        };

        match release_context(driver, detail, origin).await {
            Ok(()) => result,
            Err(e) => {
                if let Err(failure) = &result {
                    tracing::warn!("Extraction of {} failed: {}", item.detail_url, failure);
                }
                tracing::error!("Failed to release browsing context {}: {}", detail, e);
                Err(CrawlFailure::session(e))
            }
        }
    }

    async fn extract_in_context<D>(
        &self,
        driver: &mut D,
        source_type: SourceType,
        item: &ItemHandle,
        category: &str,
    ) -> Result<Document, CrawlFailure>
    where
        D: PageDriver + ?Sized,
    {
        let detail_url = item.detail_url.as_str();
        let page = self.read_detail_page(driver, detail_url).await?;
        let load_date = Utc::now();

        let document = match source_type {
            SourceType::Native => Document::native(
                page.title,
                page.body,
                detail_url,
                category,
                page.pub_date,
                load_date,
            ),
            SourceType::File => {
                let download = driver
                    .find_one(&self.selectors.download)
                    .await
                    .map_err(|e| CrawlFailure::from_driver(detail_url, e))?
                    .and_then(|element| element.href);

                match download {
                    Some(file_url) => Document::file(
                        page.title,
                        page.body,
                        file_url,
                        detail_url,
                        category,
                        page.pub_date,
                        load_date,
                    ),
                    None => {
                        tracing::debug!(
                            "No download control on {}, extracting inline content",
                            detail_url
                        );
                        Document::native(
                            page.title,
                            page.body,
                            detail_url,
                            category,
                            page.pub_date,
                            load_date,
                        )
                    }
                }
            }
        };

        Ok(document)
    }

    async fn read_detail_page<D>(&self, driver: &mut D, detail_url: &str) -> Result<DetailPage, CrawlFailure>
    where
        D: PageDriver + ?Sized,
    {
        let to_failure = |e| CrawlFailure::from_driver(detail_url, e);

        driver.navigate(detail_url).await.map_err(to_failure)?;

        let title = match wait_for_element(
            &*driver,
            &self.selectors.title,
            self.timing.element_timeout,
            self.timing.poll_interval,
        )
        .await
        .map_err(to_failure)?
        {
            WaitOutcome::Ready(element) => element.text,
            WaitOutcome::TimedOut => {
                return Err(CrawlFault::LoadTimeout {
                    url: detail_url.to_string(),
                    selector: self.selectors.title.clone(),
                    waited_ms: self.timing.element_timeout.as_millis() as u64,
                }
                .into())
            }
        };

        let pub_date = driver
            .find_one(&self.selectors.date)
            .await
            .map_err(to_failure)?
            .and_then(|element| read_date(&element));

        let body = driver
            .find_one(&self.selectors.body)
            .await
            .map_err(to_failure)?
            .map(|element| element.text)
            .unwrap_or_default();

        Ok(DetailPage {
            title,
            pub_date,
            body,
        })
    }
}

/// Parses the publish date, preferring the machine-readable `datetime` attribute
fn read_date(element: &ElementHandle) -> Option<DateTime<Utc>> {
    element
        .attr("datetime")
        .and_then(parse_pub_date)
        .or_else(|| parse_pub_date(&element.text))
}

/// Closes `detail` and makes `origin` current again, attempting both steps
async fn release_context<D>(driver: &mut D, detail: ContextHandle, origin: ContextHandle) -> DriverResult<()>
where
    D: PageDriver + ?Sized,
{
    let closed = driver.close_context(detail).await;
    let restored = driver.switch_context(origin).await;
    closed.and(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use std::time::Duration;

    const LIST: &str = "https://hub.example/content/reports/";
    const DETAIL: &str = "https://hub.example/content/reports/q3/";

    fn timing() -> CrawlTiming {
        CrawlTiming {
            settle: Duration::from_millis(20),
            element_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn item() -> ItemHandle {
        ItemHandle {
            detail_url: DETAIL.to_string(),
            label: "Q3 report".to_string(),
        }
    }

    fn driver_with(detail_html: &str) -> MemoryDriver {
        MemoryDriver::new()
            .with_page(LIST, "<ul><li class=\"card-products\">x</li></ul>")
            .with_page(DETAIL, detail_html)
    }

    const WITH_DOWNLOAD: &str = r#"<html><body>
        <h1>Q3 Report</h1>
        <time datetime="2024-03-05">March 5</time>
        <div class="entry-content"><p>Quarterly   numbers.</p></div>
        <a class="download-link" href="/files/q3.pdf">Download</a>
    </body></html>"#;

    const WITHOUT_DOWNLOAD: &str = r#"<html><body>
        <h1>Q3 Report</h1>
        <time>Published on: March 5, 2024</time>
        <div class="entry-content">Quarterly numbers.</div>
    </body></html>"#;

    async fn extract(driver: &mut MemoryDriver, source_type: SourceType) -> Result<Document, CrawlFailure> {
        driver.navigate(LIST).await.unwrap();
        let selectors = SelectorConfig::default();
        let extractor = DocumentExtractor::new(&selectors, timing());
        extractor.extract(driver, source_type, &item(), "Reports").await
    }

    #[tokio::test]
    async fn test_native_document() {
        let mut driver = driver_with(WITH_DOWNLOAD);
        let doc = extract(&mut driver, SourceType::Native).await.unwrap();

        assert_eq!(doc.title, "Q3 Report");
        assert_eq!(doc.text.as_deref(), Some("Quarterly numbers."));
        assert!(doc.abstract_text.is_none());
        assert_eq!(doc.web_link, DETAIL);
        assert_eq!(doc.category(), Some("Reports"));
        assert_eq!(
            doc.pub_date.map(|d| d.date_naive().to_string()),
            Some("2024-03-05".to_string())
        );
    }

    #[tokio::test]
    async fn test_file_document_points_at_download() {
        let mut driver = driver_with(WITH_DOWNLOAD);
        let doc = extract(&mut driver, SourceType::File).await.unwrap();

        assert!(doc.text.is_none());
        assert_eq!(doc.abstract_text.as_deref(), Some("Quarterly numbers."));
        assert_eq!(doc.web_link, "https://hub.example/files/q3.pdf");
        assert_eq!(doc.source_detail_link(), Some(DETAIL));
    }

    #[tokio::test]
    async fn test_file_without_download_falls_back_to_native() {
        let mut driver = driver_with(WITHOUT_DOWNLOAD);
        let doc = extract(&mut driver, SourceType::File).await.unwrap();

        assert!(doc.abstract_text.is_none());
        assert_eq!(doc.text.as_deref(), Some("Quarterly numbers."));
        assert_eq!(doc.web_link, DETAIL);
        assert!(doc.pub_date.is_some());
    }

    #[tokio::test]
    async fn test_missing_title_times_out() {
        let mut driver = driver_with("<html><body><p>Loading...</p></body></html>");
        let result = extract(&mut driver, SourceType::Native).await;

        assert!(matches!(
            result,
            Err(CrawlFailure::Category(CrawlFault::LoadTimeout { waited_ms: 50, .. }))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_date_is_none() {
        let mut driver = driver_with("<h1>T</h1><time>sometime soon</time><div class=\"entry-content\">b</div>");
        let doc = extract(&mut driver, SourceType::Native).await.unwrap();
        assert!(doc.pub_date.is_none());
    }

    #[tokio::test]
    async fn test_context_is_released_on_every_path() {
        for html in [WITH_DOWNLOAD, "<p>no title</p>"] {
            let mut driver = driver_with(html);
            driver.navigate(LIST).await.unwrap();
            let origin = driver.current_context();
            let before = driver.open_contexts();

            let _ = extract(&mut driver, SourceType::Native).await;

            assert_eq!(driver.open_contexts(), before);
            assert_eq!(driver.current_context(), origin);
            // The listing is still loaded in the restored context
            assert_eq!(driver.find_all("li.card-products").await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_unreachable_detail_page_is_category_fault() {
        let mut driver = MemoryDriver::new().with_page(LIST, "<p>list</p>");
        let result = extract(&mut driver, SourceType::Native).await;

        assert!(matches!(
            result,
            Err(CrawlFailure::Category(CrawlFault::Driver { .. }))
        ));
        assert_eq!(driver.open_contexts(), 1);
    }

    #[tokio::test]
    async fn test_invalid_selector_is_fatal_and_releases_context() {
        let mut driver = driver_with(WITH_DOWNLOAD);
        driver.navigate(LIST).await.unwrap();
        let selectors = SelectorConfig {
            title: "h1[[".to_string(),
            ..SelectorConfig::default()
        };
        let extractor = DocumentExtractor::new(&selectors, timing());

        let result = extractor
            .extract(&mut driver, SourceType::Native, &item(), "Reports")
            .await;

        assert!(matches!(result, Err(CrawlFailure::Fatal(_))));
        assert_eq!(driver.open_contexts(), 1);
    }
}
