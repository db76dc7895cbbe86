//! URL handling module for Feed-Harvest
//!
//! This module provides the profile handle type, profile addressing, and
//! normalization of the post addresses harvested from a rendered feed.

mod normalize;

use crate::{UrlError, UrlResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

// Re-export main functions
pub use normalize::{normalize_post_address, parse_base_url};

/// A profile handle used to address a feed
///
/// Handles are restricted to ASCII letters, digits, `.`, `_` and `-` because
/// they are also used as file and directory names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile(String);

impl Profile {
    /// Validates and wraps a profile handle
    pub fn new(handle: &str) -> UrlResult<Self> {
        let handle = handle.trim();
        let valid = !handle.is_empty()
            && handle != "."
            && handle != ".."
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if valid {
            Ok(Self(handle.to_string()))
        } else {
            Err(UrlError::InvalidProfile(handle.to_string()))
        }
    }

    /// The raw handle
    pub fn handle(&self) -> &str {
        &self.0
    }
}

impl FromStr for Profile {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A post discovered while scrolling a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    /// Absolute, normalized post address
    pub address: Url,

    /// Position in scroll order, starting at 0
    pub ordinal: usize,
}

/// Builds the feed address of a profile: `<base>/<handle>`
///
/// # Examples
///
/// ```
/// use feed_harvest::url::{parse_base_url, profile_url, Profile};
///
/// let base = parse_base_url("https://www.instagram.com").unwrap();
/// let profile = Profile::new("joerogan").unwrap();
/// assert_eq!(
///     profile_url(&base, &profile).as_str(),
///     "https://www.instagram.com/joerogan"
/// );
/// ```
pub fn profile_url(base: &Url, profile: &Profile) -> Url {
    let mut url = base.clone();
    let path = format!("{}/{}", base.path().trim_end_matches('/'), profile.handle());
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url
}
