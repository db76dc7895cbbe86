//! Post-anchor harvesting from rendered feed markup

use crate::url::normalize_post_address;
use scraper::{Html, Selector};
use url::Url;

/// Extracts post addresses from rendered feed markup, in document order
///
/// Only `<a href>` anchors whose target matches `post_prefix` on the same host
/// as `base` are kept (see [`normalize_post_address`]). The result may contain
/// duplicates; deduplication across scroll passes is the caller's job.
///
/// # Example
///
/// ```
/// use feed_harvest::extract::extract_post_links;
/// use url::Url;
///
/// let html = r#"<a href="/p/one/">1</a><a href="/explore/">x</a><a href="/p/two/">2</a>"#;
/// let base = Url::parse("https://www.instagram.com/someone").unwrap();
/// let links = extract_post_links(html, &base, "/p/");
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[1].path(), "/p/two/");
/// ```
pub fn extract_post_links(html: &str, base: &Url, post_prefix: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(address) = normalize_post_address(href, base, post_prefix) {
                    links.push(address);
                }
            }
        }
    }

    links
}
