//! HTML link discovery
//!
//! This module turns a fetched document into the ordered list of URLs a
//! worker may enqueue:
//! - Every `<a href>` is resolved against the configured base domain
//! - Non-HTTP(S) schemes (`javascript:`, `mailto:`, ...) are rejected
//! - Only links on the base domain are kept
//! - Detail-page mode additionally filters on a path glob

use crate::url::{is_same_domain, matches_path_glob, normalize_parsed};
use crate::UrlError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Link discovery policy for one crawl
#[derive(Debug, Clone)]
pub struct LinkFilter {
    base: Url,
    domain: String,
    path_pattern: Option<String>,
}

impl LinkFilter {
    /// Creates a filter for `domain`
    ///
    /// # Arguments
    ///
    /// * `domain` - Base domain (`host` or `host:port`)
    /// * `default_scheme` - Scheme given to scheme-relative and path-only links
    /// * `path_pattern` - Optional path glob a link must match to be kept
    ///
    /// # Returns
    ///
    /// * `Ok(LinkFilter)` - Ready to use
    /// * `Err(UrlError)` - `{default_scheme}://{domain}/` is not a valid URL
    pub fn new(
        domain: &str,
        default_scheme: &str,
        path_pattern: Option<String>,
    ) -> Result<Self, UrlError> {
        let base = Url::parse(&format!("{}://{}/", default_scheme, domain))
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        Ok(Self {
            base,
            domain: domain.to_lowercase(),
            path_pattern,
        })
    }

    /// Extracts the links worth enqueueing, in document order, without duplicates
    ///
    /// # Example
    ///
    /// ```
    /// use threadweave::crawler::LinkFilter;
    ///
    /// let filter = LinkFilter::new("m.sohu.com", "http", None).unwrap();
    /// let html = r#"<a href="/n/1">one</a><a href="http://other.com/">two</a>"#;
    /// let links = filter.discover(html);
    /// assert_eq!(links.len(), 1);
    /// assert_eq!(links[0].as_str(), "http://m.sohu.com/n/1");
    /// ```
    pub fn discover(&self, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };

                if let Some(url) = self.resolve_link(href) {
                    if seen.insert(url.as_str().to_string()) {
                        links.push(url);
                    }
                }
            }
        }

        links
    }

    /// Resolves a link href to a normalized absolute URL and validates it
    ///
    /// Returns None if the link should be excluded:
    /// - empty or fragment-only hrefs
    /// - javascript:, mailto:, tel: and any other non-HTTP(S) scheme
    /// - links off the base domain
    /// - links whose path misses the detail pattern, when one is set
    fn resolve_link(&self, href: &str) -> Option<Url> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut url = self.base.join(href).ok()?;
        normalize_parsed(&mut url).ok()?;

        if !is_same_domain(&url, &self.domain) {
            return None;
        }

        if let Some(pattern) = &self.path_pattern {
            if !matches_path_glob(pattern, url.path()) {
                return None;
            }
        }

        Some(url)
    }
}
