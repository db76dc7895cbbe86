use crate::UrlError;
use url::Url;

/// Parses the configured base address of the social network
///
/// Only HTTP and HTTPS are accepted (HTTP so mock servers work in tests), and
/// the address must carry a host.
pub fn parse_base_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Normalizes an anchor target into a post address
///
/// Returns `None` if the anchor does not point at a post:
/// - empty, fragment-only, or non-HTTP(S) targets
/// - targets on another host than `base`
/// - paths that do not start with `post_prefix`, or stop right after it
///
/// Accepted addresses are made absolute and stripped of query and fragment
/// so the same post reached through different tracking parameters dedups to
/// one address.
///
/// # Examples
///
/// ```
/// use feed_harvest::url::normalize_post_address;
/// use url::Url;
///
/// let base = Url::parse("https://www.instagram.com/joerogan").unwrap();
/// let post = normalize_post_address("/p/B1x2y3/?taken-by=joerogan", &base, "/p/").unwrap();
/// assert_eq!(post.as_str(), "https://www.instagram.com/p/B1x2y3/");
/// assert!(normalize_post_address("/explore/", &base, "/p/").is_none());
/// ```
pub fn normalize_post_address(href: &str, base: &Url, post_prefix: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    if url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return None;
    }

    let rest = url.path().strip_prefix(post_prefix)?;
    if rest.trim_matches('/').is_empty() {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}
