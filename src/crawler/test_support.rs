//! Canned fetchers and config shared by the crawler unit tests

use crate::config::{parse_config, Config};
use crate::crawler::fetcher::Fetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves canned pages and counts how often each URL was requested
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn call_counts(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Option<String> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.as_str().to_string())
            .or_insert(0) += 1;
        self.pages.get(url.as_str()).cloned()
    }
}

/// HTML page linking to each of `hrefs`
pub fn links_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

/// Fast-polling config for `example.com` seeded at its root
pub fn test_config(workers: usize, extra_crawler: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
workers = {}
domain = "example.com"
seeds = ["http://example.com/"]
pop-timeout-ms = 20
poll-interval-ms = 5
max-poll-interval-ms = 20
{}

[retry]
base-wait-secs = 0.0
"#,
        workers, extra_crawler
    ))
    .unwrap()
}
