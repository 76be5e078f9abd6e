//! HTML link extraction
//!
//! Pulls crawlable links out of a fetched page. The document is parsed in
//! one synchronous call and the surviving links are handed back as an owned
//! iterator, so nothing borrowed from the DOM crosses an `.await`.

use crate::url::normalize_parsed;
use crate::UrlError;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Reasons an individual `href` is dropped
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty href")]
    Empty,

    #[error("non-navigational href: {0}")]
    Skipped(String),

    #[error("cannot resolve '{href}': {source}")]
    Resolve {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("rejected '{href}': {source}")]
    Rejected {
        href: String,
        #[source]
        source: UrlError,
    },
}

/// Extracts the normalized links of a page, in document order
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Links whose normalized form is not http(s), has no host, or is longer
///   than `max_len`
///
/// # Arguments
///
/// * `base_url` - URL the page was fetched from, used for relative links
/// * `content` - Raw page body; invalid UTF-8 is replaced
/// * `max_len` - Maximum accepted URL length
///
/// # Example
///
/// ```
/// use trawler::crawler::extract_links;
/// use url::Url;
///
/// let html = br#"<a href="/news">News</a><a href="mailto:x@example.com">Mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links: Vec<Url> = extract_links(&base, html, 120).collect();
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/news");
/// ```
pub fn extract_links(base_url: &Url, content: &[u8], max_len: usize) -> impl Iterator<Item = Url> {
    let html = String::from_utf8_lossy(content);
    let document = Html::parse_document(&html);

    let mut links = Vec::new();
    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };

            match resolve_link(href, base_url, max_len) {
                Ok(url) => links.push(url),
                Err(e) => tracing::trace!("Skipping link on {}: {}", base_url, e),
            }
        }
    }

    links.into_iter()
}

/// Resolves an href against the page URL and normalizes it
fn resolve_link(href: &str, base_url: &Url, max_len: usize) -> Result<Url, ParseError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(ParseError::Empty);
    }

    let lowered = href.to_ascii_lowercase();
    if href.starts_with('#') || SKIPPED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return Err(ParseError::Skipped(href.to_string()));
    }

    let absolute = base_url.join(href).map_err(|source| ParseError::Resolve {
        href: href.to_string(),
        source,
    })?;

    normalize_parsed(absolute, max_len).map_err(|source| ParseError::Rejected {
        href: href.to_string(),
        source,
    })
}
