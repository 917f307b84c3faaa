//! Crawler module for fetching, link discovery and record extraction
//!
//! This module contains the core crawling logic, including:
//! - Bounded retries with randomized backoff
//! - HTTP fetching with charset fallback
//! - Same-domain link discovery
//! - Selector-based record extraction
//! - The worker state machine and the coordinator that drives the pool

mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod retry;
mod worker;

#[cfg(test)]
mod test_support;

pub use coordinator::{Coordinator, CrawlComponents};
pub use extractor::{ExtractedRecord, Extractor, SelectorExtractor};
pub use fetcher::{build_http_client, decode_page, resolve_charsets, FetchError, Fetcher, HttpFetcher};
pub use parser::LinkFilter;
pub use retry::RetryPolicy;
pub use worker::{Worker, WorkerContext};
