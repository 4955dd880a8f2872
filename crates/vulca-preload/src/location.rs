//! Current page location and link eligibility

use crate::{Element, Result};
use url::Url;

/// The page the scheduler runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Create from a parsed URL
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse the page URL
    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Page URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve an href against the page URL
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.url.join(href.trim())?)
    }

    /// Check if a URL has the page's scheme, host and port.
    /// Only http(s) URLs are considered.
    pub fn is_same_origin(&self, other: &Url) -> bool {
        matches!(other.scheme(), "http" | "https") && self.url.origin() == other.origin()
    }

    /// Path to preload for a link, if the link is eligible.
    ///
    /// Eligible links stay in the current browsing context and resolve to
    /// the page's origin. A hash-router fragment (`#/…`) is kept on the
    /// returned path; any other fragment and the query are dropped.
    pub fn preload_path(&self, link: &Element) -> Option<String> {
        if !link.targets_self() {
            return None;
        }

        let href = link.href.as_deref()?;
        let url = self.resolve(href).ok()?;
        if !self.is_same_origin(&url) {
            return None;
        }

        let mut path = url.path().to_string();
        if let Some(fragment) = url.fragment().filter(|f| f.starts_with('/')) {
            path.push('#');
            path.push_str(fragment);
        }
        Some(path)
    }
}
