//! Post-page metadata extraction
//!
//! A post page carries everything the harvester needs in its `<head>`:
//! - `<meta name="medium" content="image|video">` classifies the post
//! - the description meta starts with the like count (`"2.1k Likes, 30 Comments - ..."`)
//! - `<title>` holds the caption-derived title
//! - `og:image` / `og:video` point at the media itself
//!
//! Every lookup is an independent fallible step. A failed step leaves only its
//! own field absent and never raises to the caller.

use crate::extract::numeric::parse_count;
use crate::extract::FormatError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use url::Url;

/// Kind of media a post carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Classifies a medium descriptor value
    pub fn from_medium(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Unknown,
        }
    }

    /// File extension used when the media is saved
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Image => Some("jpg"),
            Self::Video => Some("mp4"),
            Self::Unknown => None,
        }
    }

    /// Returns true if posts of this kind are downloaded
    pub fn is_downloadable(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata extracted from one post page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub media_kind: MediaKind,
    pub like_count: Option<u64>,
    pub title: Option<String>,
}

impl ExtractedMetadata {
    /// Returns true if nothing could be extracted (a fully malformed page)
    pub fn is_empty(&self) -> bool {
        self.media_kind == MediaKind::Unknown && self.like_count.is_none() && self.title.is_none()
    }
}

/// A parsed post page: its metadata plus the resolved media address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPage {
    pub metadata: ExtractedMetadata,

    /// Absolute media address; only resolved for Image and Video posts
    pub media_url: Option<Url>,
}

/// Extracts media kind, like count and title from raw post markup
///
/// # Example
///
/// ```
/// use feed_harvest::extract::{extract_metadata, MediaKind};
///
/// let html = r#"<html><head>
///     <title>A day at the beach</title>
///     <meta name="medium" content="image">
///     <meta content="2.1k Likes, 30 Comments" name="description">
/// </head></html>"#;
///
/// let metadata = extract_metadata(html);
/// assert_eq!(metadata.media_kind, MediaKind::Image);
/// assert_eq!(metadata.like_count, Some(2100));
/// assert_eq!(metadata.title.as_deref(), Some("A day at the beach"));
/// ```
pub fn extract_metadata(html: &str) -> ExtractedMetadata {
    let document = Html::parse_document(html);
    metadata_from_document(&document)
}

/// Parses a post page and resolves its media address against `page_url`
pub fn parse_post_page(html: &str, page_url: &Url) -> PostPage {
    let document = Html::parse_document(html);
    let metadata = metadata_from_document(&document);

    let media_url = if metadata.media_kind.is_downloadable() {
        field(
            "media url",
            find_media_url(&document, metadata.media_kind, page_url),
        )
    } else {
        None
    };

    PostPage {
        metadata,
        media_url,
    }
}

fn metadata_from_document(document: &Html) -> ExtractedMetadata {
    ExtractedMetadata {
        media_kind: field("media kind", find_media_kind(document)).unwrap_or_default(),
        like_count: field("like count", find_like_count(document)),
        title: field("title", find_title(document)),
    }
}

/// Collapses one extraction step to an optional value
fn field<T>(name: &str, result: Result<T, FormatError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(field = name, error = %e, "Metadata field unavailable");
            None
        }
    }
}

fn selector(css: &str) -> Result<Selector, FormatError> {
    Selector::parse(css).map_err(|e| FormatError::InvalidSelector(format!("{}: {:?}", css, e)))
}

fn first_content<'a>(document: &'a Html, css: &str) -> Result<Option<&'a str>, FormatError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty()))
}

fn find_media_kind(document: &Html) -> Result<MediaKind, FormatError> {
    first_content(document, r#"meta[name="medium"][content]"#)?
        .map(MediaKind::from_medium)
        .ok_or(FormatError::Missing("medium descriptor"))
}

fn find_like_count(document: &Html) -> Result<u64, FormatError> {
    let content = match first_content(document, r#"meta[name="description"][content]"#)? {
        Some(content) => content,
        None => {
            let selector = selector("meta[content]")?;
            document
                .select(&selector)
                .find(is_generic_content_meta)
                .and_then(|element| element.value().attr("content"))
                .ok_or(FormatError::Missing("content descriptor"))?
        }
    };

    let token = content
        .split_whitespace()
        .next()
        .ok_or(FormatError::Missing("like count token"))?;

    parse_count(token)
}

/// A `<meta content=...>` that is not a named or typed property
fn is_generic_content_meta(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    ["name", "property", "http-equiv", "itemprop", "charset"]
        .iter()
        .all(|attr| value.attr(attr).is_none())
}

fn find_title(document: &Html) -> Result<String, FormatError> {
    let selector = selector("title")?;
    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .replace(['\n', '\r'], "")
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
        .ok_or(FormatError::Missing("title"))
}

fn find_media_url(document: &Html, kind: MediaKind, page_url: &Url) -> Result<Url, FormatError> {
    let candidates: &[&str] = match kind {
        MediaKind::Image => &[r#"meta[property="og:image"]"#],
        MediaKind::Video => &[
            r#"meta[property="og:video"]"#,
            r#"meta[property="og:video:secure_url"]"#,
        ],
        MediaKind::Unknown => &[],
    };

    for css in candidates {
        if let Some(content) = first_content(document, css)? {
            return page_url
                .join(content)
                .map_err(|e| FormatError::InvalidMediaUrl(format!("{}: {}", content, e)));
        }
    }

    Err(FormatError::Missing("media url"))
}
