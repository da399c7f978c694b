//! HTTP page driver
//!
//! This driver handles hubs whose listings and detail pages are served as
//! static HTML:
//! - Building HTTP clients with a polite user agent string
//! - GET requests per navigation, one stored document per browsing context
//! - Element queries over the stored document
//!
//! Scripts are not executed. A scroll therefore never reveals new items, and
//! the paginator sees a fully loaded listing after its first measurement.

use super::snapshot::select_elements;
use super::{ContextHandle, DriverError, DriverResult, ElementHandle, PageDriver};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use hub_harvester::config::UserAgentConfig;
/// use hub_harvester::driver::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "HubHarvester".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// Page driver that fetches static HTML over HTTP
pub struct HttpDriver {
    client: Client,
    contexts: BTreeMap<ContextHandle, Option<LoadedPage>>,
    current: ContextHandle,
    next_handle: u64,
}

impl HttpDriver {
    /// Creates a driver with one open, empty context
    pub fn new(client: Client) -> Self {
        let initial = ContextHandle(0);
        let mut contexts = BTreeMap::new();
        contexts.insert(initial, None);

        Self {
            client,
            contexts,
            current: initial,
            next_handle: 1,
        }
    }

    /// Creates a driver whose client identifies itself with `config`
    pub fn from_user_agent(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }

    fn page(&self) -> DriverResult<&LoadedPage> {
        self.contexts
            .get(&self.current)
            .ok_or(DriverError::UnknownContext(self.current))?
            .as_ref()
            .ok_or(DriverError::NoPage(self.current))
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        if !self.contexts.contains_key(&self.current) {
            return Err(DriverError::UnknownContext(self.current));
        }

        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            DriverError::Navigation {
                url: url.to_string(),
                message,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await?;

        self.contexts.insert(
            self.current,
            Some(LoadedPage {
                url: final_url,
                html,
            }),
        );
        Ok(())
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<()> {
        self.page()?;
        tracing::trace!("Static page, script not executed: {}", script);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let page = self.page()?;
        select_elements(&page.html, Some(&page.url), selector)
    }

    async fn open_context(&mut self) -> DriverResult<ContextHandle> {
        let handle = ContextHandle(self.next_handle);
        self.next_handle += 1;
        self.contexts.insert(handle, None);
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        assert!(build_http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_navigate_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/"))
            .and(header(
                "user-agent",
                "TestHarvester/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<ul><li class="card"><a href="/news/one/">One</a></li></ul>"#)
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let mut driver = HttpDriver::from_user_agent(&create_test_config()).unwrap();
        driver.navigate(&format!("{}/news/", server.uri())).await.unwrap();

        let items = driver.find_all("li.card").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, Some(format!("{}/news/one/", server.uri())));
    }

    #[tokio::test]
    async fn test_http_error_is_navigation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut driver = HttpDriver::from_user_agent(&create_test_config()).unwrap();
        let result = driver.navigate(&format!("{}/gone", server.uri())).await;

        match result {
            Err(DriverError::Navigation { message, .. }) => assert_eq!(message, "HTTP 404"),
            other => panic!("expected navigation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_before_navigation() {
        let driver = HttpDriver::from_user_agent(&create_test_config()).unwrap();
        assert!(matches!(
            driver.find_all("h1").await,
            Err(DriverError::NoPage(_))
        ));
    }

    #[tokio::test]
    async fn test_context_bookkeeping() {
        let mut driver = HttpDriver::from_user_agent(&create_test_config()).unwrap();
        let main = driver.current_context();
        let extra = driver.open_context().await.unwrap();
        assert_eq!(driver.open_contexts(), 2);

        driver.switch_context(extra).await.unwrap();
        assert_eq!(driver.current_context(), extra);
        driver.close_context(extra).await.unwrap();
        driver.switch_context(main).await.unwrap();
        assert_eq!(driver.open_contexts(), 1);
    }
}
