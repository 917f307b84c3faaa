//! Crawl worker state machine
//!
//! A worker loops over the shared work queue until its shutdown token fires.
//! Each popped URL is one unit of work:
//!
//! 1. Flip to `Working`
//! 2. Claim the URL in the visited set (skip it if someone else already did)
//! 3. Fetch it and enqueue every discovered link not yet visited
//! 4. In sample-extract mode, draw one URL from the sample pool, fetch it
//!    again, extract a record and store it
//! 5. Flip back to `Idle` and wake the coordinator
//!
//! No failure inside a unit is fatal to the worker. Backend errors, absent
//! pages and store failures are logged and counted, and the worker moves on.

use crate::config::CrawlMode;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::LinkFilter;
use crate::frontier::{VisitedSet, WorkQueue};
use crate::output::CrawlStats;
use crate::state::{SpiderStatus, StatusCell};
use crate::storage::RecordStore;
use crate::url::normalize_url;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything the workers of one crawl share
pub struct WorkerContext {
    pub queue: Arc<dyn WorkQueue>,
    pub visited: Arc<dyn VisitedSet>,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub store: Arc<dyn RecordStore>,
    pub links: LinkFilter,
    pub mode: CrawlMode,

    /// Normalized URLs never sampled for extraction
    pub sentinels: HashSet<String>,

    pub pop_timeout: Duration,
    pub stats: Arc<CrawlStats>,

    /// Signalled every time a worker returns to `Idle`
    pub idle_notify: Arc<Notify>,
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    status: Arc<StatusCell>,
    ctx: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(id: usize, status: Arc<StatusCell>, ctx: Arc<WorkerContext>) -> Self {
        Self { id, status, ctx }
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// Cancellation is observed between pops, so an in-flight unit always
    /// completes and the status is `Idle` when this returns.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::debug!(worker = self.id, "Worker started");

        while !shutdown.is_cancelled() {
            let popped = match self.ctx.queue.pop(self.ctx.pop_timeout).await {
                Ok(popped) => popped,
                Err(e) => {
                    tracing::error!(worker = self.id, "Work queue pop failed: {}", e);
                    CrawlStats::incr(&self.ctx.stats.backend_errors);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.ctx.pop_timeout) => continue,
                    }
                }
            };

            let Some(raw) = popped else {
                continue;
            };

            self.status.set(SpiderStatus::Working);
            self.process(&raw).await;
            self.status.set(SpiderStatus::Idle);
            self.ctx.idle_notify.notify_one();
        }

        tracing::debug!(worker = self.id, "Worker stopped");
    }

    /// Handles one popped URL
    async fn process(&self, raw: &str) {
        CrawlStats::incr(&self.ctx.stats.popped);

        match normalize_url(raw) {
            Ok(url) => self.claim_and_crawl(&url).await,
            Err(e) => tracing::warn!(worker = self.id, "Dropping queued URL '{}': {}", raw, e),
        }

        if self.ctx.mode == CrawlMode::SampleExtract {
            self.sample_and_extract().await;
        }
    }

    async fn claim_and_crawl(&self, url: &Url) {
        let claimed = match self.ctx.visited.add(url.as_str()).await {
            Ok(claimed) => claimed,
            Err(e) => {
                self.backend_error("claim", url.as_str(), &e);
                return;
            }
        };

        if !claimed {
            tracing::debug!(worker = self.id, "Already visited: {}", url);
            CrawlStats::incr(&self.ctx.stats.skipped);
            return;
        }
        CrawlStats::incr(&self.ctx.stats.claimed);

        let Some(page) = self.fetch(url).await else {
            return;
        };
        if page.is_empty() {
            return;
        }

        for link in self.ctx.links.discover(&page) {
            match self.ctx.visited.contains(link.as_str()).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    self.backend_error("membership check", link.as_str(), &e);
                    continue;
                }
            }

            match self.ctx.queue.push(link.as_str()).await {
                Ok(()) => CrawlStats::incr(&self.ctx.stats.enqueued),
                Err(e) => self.backend_error("enqueue", link.as_str(), &e),
            }
        }
    }

    /// Draws one visited URL and turns it into a stored record if it has one
    async fn sample_and_extract(&self) {
        let candidate = match self.ctx.visited.pop_arbitrary().await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return,
            Err(e) => {
                self.backend_error("sample", "-", &e);
                return;
            }
        };

        if self.ctx.sentinels.contains(&candidate) {
            tracing::debug!(worker = self.id, "Not sampling sentinel {}", candidate);
            return;
        }

        let url = match normalize_url(&candidate) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(worker = self.id, "Unusable sample '{}': {}", candidate, e);
                return;
            }
        };
        CrawlStats::incr(&self.ctx.stats.sampled);

        let Some(page) = self.fetch(&url).await else {
            return;
        };

        let Some(record) = self.ctx.extractor.extract(&page) else {
            tracing::debug!(worker = self.id, "No record on {}", url);
            CrawlStats::incr(&self.ctx.stats.extract_misses);
            return;
        };

        match self.ctx.store.store(&url, &record) {
            Ok(()) => {
                tracing::info!(worker = self.id, "Stored record '{}' from {}", record.title, url);
                CrawlStats::incr(&self.ctx.stats.records_stored);
            }
            Err(e) => {
                tracing::error!(worker = self.id, "Failed to store record from {}: {}", url, e);
                CrawlStats::incr(&self.ctx.stats.store_failures);
            }
        }
    }

    async fn fetch(&self, url: &Url) -> Option<String> {
        tracing::debug!(worker = self.id, "[worker-{} Fetch] {}", self.id, url);

        let page = self.ctx.fetcher.fetch(url).await;
        if page.is_some() {
            CrawlStats::incr(&self.ctx.stats.fetched);
        } else {
            CrawlStats::incr(&self.ctx.stats.fetch_failures);
        }
        page
    }

    fn backend_error(&self, operation: &str, url: &str, error: &dyn std::fmt::Display) {
        tracing::error!(worker = self.id, "Backend {} failed for {}: {}", operation, url, error);
        CrawlStats::incr(&self.ctx.stats.backend_errors);
    }
}
