//! Element lookup over static HTML
//!
//! Both shipped drivers keep the current page as an HTML string and answer
//! element queries by parsing it with `scraper`.

use super::{DriverError, DriverResult, ElementHandle};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Finds every element matching `selector` in `html`
///
/// # Arguments
///
/// * `html` - The page content
/// * `base_url` - The page URL, used to resolve relative links
/// * `selector` - A CSS selector
///
/// # Returns
///
/// * `Ok(Vec<ElementHandle>)` - Matching elements in document order
/// * `Err(DriverError::InvalidSelector)` - The selector does not parse
///
/// # Example
///
/// ```
/// use hub_harvester::driver::select_elements;
/// use url::Url;
///
/// let html = r#"<ul><li class="card"><a href="/a">First</a></li></ul>"#;
/// let base = Url::parse("https://hub.example/list/").unwrap();
/// let items = select_elements(html, Some(&base), "li.card").unwrap();
/// assert_eq!(items[0].href.as_deref(), Some("https://hub.example/a"));
/// ```
pub fn select_elements(
    html: &str,
    base_url: Option<&Url>,
    selector: &str,
) -> DriverResult<Vec<ElementHandle>> {
    let parsed_selector =
        Selector::parse(selector).map_err(|_| DriverError::InvalidSelector(selector.to_string()))?;
    let link_selector = Selector::parse("a[href]")
        .map_err(|_| DriverError::InvalidSelector("a[href]".to_string()))?;

    let document = Html::parse_document(html);

    Ok(document
        .select(&parsed_selector)
        .map(|element| to_handle(element, &link_selector, base_url))
        .collect())
}

fn to_handle(element: ElementRef<'_>, link_selector: &Selector, base_url: Option<&Url>) -> ElementHandle {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    let attributes = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let raw_href = element.value().attr("href").or_else(|| {
        element
            .select(link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
    });

    ElementHandle {
        text,
        href: raw_href.and_then(|href| resolve_href(href, base_url)),
        attributes,
    }
}

/// Resolves a link against the page URL, dropping non-navigable targets
fn resolve_href(href: &str, base_url: Option<&Url>) -> Option<String> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let resolved = match base_url {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}
