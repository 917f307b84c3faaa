//! Crawler coordinator - crawl orchestration and termination
//!
//! This module owns the lifecycle of one crawl:
//! - Building the queue, visited set, fetcher, extractor and store
//! - Seeding the queue when it starts out empty
//! - Spawning the fixed worker pool
//! - Waiting until the queue is empty and every worker is idle
//! - Shutting the pool down and producing a summary

use crate::config::{Config, CrawlMode};
use crate::crawler::extractor::{Extractor, SelectorExtractor};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::LinkFilter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::worker::{Worker, WorkerContext};
use crate::frontier::{open_frontier, VisitedSet, WorkQueue};
use crate::output::{CrawlStats, CrawlSummary};
use crate::state::StatusCell;
use crate::storage::{open_store, RecordStore};
use crate::url::normalize_url;
use crate::Result;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// The injected services a crawl runs on
#[derive(Clone)]
pub struct CrawlComponents {
    pub queue: Arc<dyn WorkQueue>,
    pub visited: Arc<dyn VisitedSet>,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub store: Arc<dyn RecordStore>,
}

impl CrawlComponents {
    /// Builds the components described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlComponents)` - Everything is reachable
    /// * `Err(CrawlError)` - Redis unreachable, bad proxy, bad selector or
    ///   unopenable database
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (queue, visited) = open_frontier(&config.backend).await?;

        let fetcher = HttpFetcher::from_config(
            &config.fetch,
            RetryPolicy::from_config(&config.retry),
            config.retry.retry_on,
        )?;
        let extractor = SelectorExtractor::from_config(&config.extract)?;
        let store = open_store(&config.output)?;

        Ok(Self {
            queue,
            visited,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            store,
        })
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    components: CrawlComponents,
    shutdown: CancellationToken,
    stats: Arc<CrawlStats>,
}

impl Coordinator {
    /// Creates a coordinator with components built from `config`
    pub async fn new(config: Config) -> Result<Self> {
        let components = CrawlComponents::from_config(&config).await?;
        Ok(Self::with_components(config, components))
    }

    /// Creates a coordinator over caller-supplied components
    pub fn with_components(config: Config, components: CrawlComponents) -> Self {
        Self {
            config,
            components,
            shutdown: CancellationToken::new(),
            stats: Arc::new(CrawlStats::new()),
        }
    }

    /// Token that stops the crawl early when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn components(&self) -> &CrawlComponents {
        &self.components
    }

    /// Forgets all queued work and every visited URL
    pub async fn reset(&self) -> Result<()> {
        tracing::info!("Clearing work queue and visited set");
        self.components.queue.clear().await?;
        self.components.visited.clear().await?;
        Ok(())
    }

    /// Pushes the seed URLs if the work queue is empty
    ///
    /// A non-empty queue means another process already runs this crawl, so
    /// it is joined rather than reseeded.
    ///
    /// # Returns
    ///
    /// The number of seeds pushed
    pub async fn seed(&self) -> Result<usize> {
        if !self.components.queue.is_empty().await? {
            let pending = self.components.queue.len().await?;
            tracing::info!("Joining existing crawl with {} queued URLs", pending);
            return Ok(0);
        }

        let mut pushed = 0;
        for seed in &self.config.crawler.seeds {
            let url = normalize_url(seed)?;
            self.components.queue.push(url.as_str()).await?;
            pushed += 1;
        }

        tracing::info!("Seeded work queue with {} URLs", pushed);
        Ok(pushed)
    }

    /// Runs the crawl to completion or until the shutdown token fires
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Counters for the finished crawl
    /// * `Err(CrawlError)` - Seeding failed or a worker task panicked
    pub async fn run(self) -> Result<CrawlSummary> {
        let started_at = Utc::now();
        let crawler = &self.config.crawler;

        self.seed().await?;

        let path_pattern = match crawler.mode {
            CrawlMode::Discover => None,
            CrawlMode::SampleExtract => crawler.detail_path_pattern.clone(),
        };
        let links = LinkFilter::new(&crawler.domain, &crawler.default_scheme, path_pattern)?;

        let mut sentinels = HashSet::new();
        for url in crawler.seeds.iter().chain(&crawler.sentinel_urls) {
            sentinels.insert(normalize_url(url)?.to_string());
        }

        let idle_notify = Arc::new(Notify::new());
        let ctx = Arc::new(WorkerContext {
            queue: Arc::clone(&self.components.queue),
            visited: Arc::clone(&self.components.visited),
            fetcher: Arc::clone(&self.components.fetcher),
            extractor: Arc::clone(&self.components.extractor),
            store: Arc::clone(&self.components.store),
            links,
            mode: crawler.mode,
            sentinels,
            pop_timeout: crawler.pop_timeout(),
            stats: Arc::clone(&self.stats),
            idle_notify: Arc::clone(&idle_notify),
        });

        tracing::info!(
            "Starting crawl of {} with {} workers in {:?} mode",
            crawler.domain,
            crawler.workers,
            crawler.mode
        );

        let workers_token = self.shutdown.child_token();
        let mut statuses = Vec::with_capacity(crawler.workers);
        let mut handles = Vec::with_capacity(crawler.workers);
        for id in 0..crawler.workers {
            let status = Arc::new(StatusCell::new());
            statuses.push(Arc::clone(&status));
            let worker = Worker::new(id, status, Arc::clone(&ctx));
            handles.push(tokio::spawn(worker.run(workers_token.clone())));
        }

        if self.wait_until_quiet(&statuses, &idle_notify).await {
            tracing::info!("Work queue drained and all workers idle, crawl complete");
        } else {
            tracing::warn!("Crawl interrupted, stopping workers");
        }

        workers_token.cancel();
        for handle in handles {
            handle.await?;
        }

        let visited = self.components.visited.len().await?;
        Ok(CrawlSummary::from_stats(
            &self.stats,
            started_at,
            Utc::now(),
            crawler.workers,
            visited,
        ))
    }

    /// Waits for `quiet-checks` consecutive observations of an empty queue
    /// with every worker idle
    ///
    /// Wakes on worker idle notifications, falling back to exponential
    /// backoff polling. Returns `false` if the shutdown token fired first.
    async fn wait_until_quiet(&self, statuses: &[Arc<StatusCell>], idle_notify: &Notify) -> bool {
        let crawler = &self.config.crawler;
        let mut interval = crawler.poll_interval();
        let mut quiet = 0;

        loop {
            if self.shutdown.is_cancelled() {
                return false;
            }

            let all_idle = statuses.iter().all(|status| status.is_idle());
            let queue_empty = match self.components.queue.is_empty().await {
                Ok(empty) => empty,
                Err(e) => {
                    tracing::error!("Work queue length check failed: {}", e);
                    CrawlStats::incr(&self.stats.backend_errors);
                    false
                }
            };

            if all_idle && queue_empty {
                quiet += 1;
                if quiet >= crawler.quiet_checks {
                    return true;
                }
                // A worker may have popped the last URL without flipping to
                // Working yet; look again after a pause
                tokio::select! {
                    _ = self.shutdown.cancelled() => return false,
                    _ = tokio::time::sleep(crawler.poll_interval()) => {}
                }
                continue;
            }

            quiet = 0;
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                _ = idle_notify.notified() => {
                    interval = crawler.poll_interval();
                }
                _ = tokio::time::sleep(interval) => {
                    interval = (interval * 2).min(crawler.max_poll_interval());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::test_support::{links_page, test_config, StaticFetcher};
    use crate::frontier::{LocalQueue, LocalVisitedSet};
    use crate::storage::MemoryRecordStore;
    use std::time::Duration;

    fn components(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<MemoryRecordStore>,
        config: &Config,
    ) -> CrawlComponents {
        CrawlComponents {
            queue: Arc::new(LocalQueue::new()),
            visited: Arc::new(LocalVisitedSet::new()),
            fetcher,
            extractor: Arc::new(SelectorExtractor::from_config(&config.extract).unwrap()),
            store,
        }
    }

    async fn run_crawl(config: Config, components: CrawlComponents) -> CrawlSummary {
        let coordinator = Coordinator::with_components(config, components);
        tokio::time::timeout(Duration::from_secs(10), coordinator.run())
            .await
            .expect("crawl did not terminate")
            .unwrap()
    }

    fn detail_page(title: &str, sub_title: &str, content: &str) -> String {
        format!(
            r#"<html><body>
                <a href="/html/lizhi/index.html">{}</a>
                <div class="title"><h2>{}</h2></div>
                <div class="content">{}</div>
            </body></html>"#,
            title, sub_title, content
        )
    }

    #[tokio::test]
    async fn test_cyclic_graph_fetches_each_url_once() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("http://example.com/", &links_page(&["/a", "/b", "/c"]))
                .page("http://example.com/a", &links_page(&["/", "/b", "/c"]))
                .page("http://example.com/b", &links_page(&["/a", "/c", "/"]))
                .page("http://example.com/c", &links_page(&["/a", "/b", "/c", "/"])),
        );
        let config = test_config(4, "");
        let components = components(fetcher.clone(), Arc::new(MemoryRecordStore::new()), &config);

        let summary = run_crawl(config, components.clone()).await;

        let counts = fetcher.call_counts();
        assert_eq!(counts.len(), 4);
        for (url, count) in counts {
            assert_eq!(count, 1, "{} fetched {} times", url, count);
        }
        assert_eq!(summary.claimed, 4);
        assert_eq!(summary.visited, 4);
    }

    /// Site on `example.com` where every page links to every page
    fn dense_site(paths: &[String], extra_html: &str) -> StaticFetcher {
        let hrefs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let html = links_page(&hrefs).replace("</body>", &format!("{}</body>", extra_html));
        paths.iter().fold(StaticFetcher::new(), |fetcher, path| {
            fetcher.page(&format!("http://example.com{}", path), &html)
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_dense_graph_parallel_workers_fetch_each_url_once() {
        let mut paths = vec!["/".to_string()];
        paths.extend((1..31).map(|i| format!("/p{}", i)));

        for round in 0..10 {
            let fetcher = Arc::new(dense_site(&paths, ""));
            let config = test_config(8, "");
            let components =
                components(fetcher.clone(), Arc::new(MemoryRecordStore::new()), &config);

            let summary = run_crawl(config, components.clone()).await;

            let counts = fetcher.call_counts();
            assert_eq!(counts.len(), paths.len(), "round {}", round);
            for (url, count) in counts {
                assert_eq!(count, 1, "round {}: {} fetched {} times", round, url, count);
            }
            assert_eq!(summary.claimed, paths.len() as u64);
            assert_eq!(summary.visited, paths.len());
            assert!(components.queue.is_empty().await.unwrap());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_dense_graph_parallel_sampling_stores_each_page_at_most_once() {
        let mut paths = vec!["/".to_string()];
        paths.extend((1..31).map(|i| format!("/html/{}.html", i)));
        let fields = r#"<a href="/index.html">T</a>
            <div class="title"><h2>S</h2></div>
            <div class="content">C</div>"#;

        for round in 0..10 {
            let fetcher = Arc::new(dense_site(&paths, fields));
            let config = test_config(
                8,
                r#"mode = "sample-extract"
detail-path-pattern = "/html/*.html""#,
            );
            let store = Arc::new(MemoryRecordStore::new());
            let components = components(fetcher.clone(), store.clone(), &config);

            let summary = run_crawl(config, components.clone()).await;

            let mut stored = HashSet::new();
            for (url, _) in store.records() {
                assert!(stored.insert(url.to_string()), "round {}: {} stored twice", round, url);
            }
            assert!(!stored.contains("http://example.com/"));
            assert_eq!(summary.records_stored as usize, stored.len());
            assert_eq!(summary.visited, paths.len());
            for (url, count) in fetcher.call_counts() {
                assert!(count <= 2, "round {}: {} fetched {} times", round, url, count);
            }
            assert!(components.queue.is_empty().await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_queue_drains_and_all_links_visited() {
        let leaves = ["/1", "/2", "/3", "/4", "/5"];
        let mut fetcher = StaticFetcher::new().page("http://example.com/", &links_page(&leaves));
        for leaf in leaves {
            fetcher = fetcher.page(&format!("http://example.com{}", leaf), "<html></html>");
        }
        let config = test_config(3, "");
        let components = components(Arc::new(fetcher), Arc::new(MemoryRecordStore::new()), &config);

        let summary = run_crawl(config, components.clone()).await;

        assert!(components.queue.is_empty().await.unwrap());
        assert_eq!(summary.visited, 6);
        assert!(components.visited.contains("http://example.com/").await.unwrap());
        for leaf in leaves {
            let url = format!("http://example.com{}", leaf);
            assert!(components.visited.contains(&url).await.unwrap(), "{} not visited", url);
        }
    }

    #[tokio::test]
    async fn test_absent_pages_do_not_stall_termination() {
        // Nothing is served, every fetch is absent
        let config = test_config(2, "");
        let components = components(
            Arc::new(StaticFetcher::new()),
            Arc::new(MemoryRecordStore::new()),
            &config,
        );

        let summary = run_crawl(config, components).await;

        assert_eq!(summary.popped, 1);
        assert_eq!(summary.fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_off_domain_and_javascript_links_not_followed() {
        let fetcher = Arc::new(StaticFetcher::new().page(
            "http://example.com/",
            &links_page(&["http://other.com/x", "javascript:void(0)", "/ok"]),
        ));
        let config = test_config(2, "");
        let components = components(fetcher.clone(), Arc::new(MemoryRecordStore::new()), &config);

        run_crawl(config, components).await;

        assert_eq!(fetcher.calls("http://example.com/ok"), 1);
        assert_eq!(fetcher.calls("http://other.com/x"), 0);
        assert_eq!(fetcher.call_counts().len(), 2);
    }

    #[tokio::test]
    async fn test_sample_extract_stores_exactly_one_record() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page(
                    "http://example.com/",
                    &links_page(&["/html/lizhi/1.html", "/about.html"]),
                )
                .page("http://example.com/html/lizhi/1.html", &detail_page("T", "S", "C")),
        );
        let config = test_config(
            1,
            r#"mode = "sample-extract"
detail-path-pattern = "/html/*.html""#,
        );
        let store = Arc::new(MemoryRecordStore::new());
        let components = components(fetcher.clone(), store.clone(), &config);

        let summary = run_crawl(config, components).await;

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.as_str(), "http://example.com/html/lizhi/1.html");
        assert_eq!(records[0].1.title, "T");
        assert_eq!(records[0].1.sub_title, "S");
        assert_eq!(records[0].1.content, "C");

        // Seed is a sentinel and never re-fetched for extraction
        assert_eq!(fetcher.calls("http://example.com/"), 1);
        assert_eq!(fetcher.calls("http://example.com/html/lizhi/1.html"), 2);
        assert_eq!(fetcher.calls("http://example.com/about.html"), 0);
        assert_eq!(summary.records_stored, 1);
    }

    #[tokio::test]
    async fn test_sample_extract_missing_field_stores_nothing() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("http://example.com/", &links_page(&["/html/a/1.html"]))
                .page("http://example.com/html/a/1.html", &detail_page("T", "", "C")),
        );
        let config = test_config(
            1,
            r#"mode = "sample-extract"
detail-path-pattern = "/html/*.html""#,
        );
        let store = Arc::new(MemoryRecordStore::new());
        let components = components(fetcher, store.clone(), &config);

        let summary = run_crawl(config, components).await;

        assert!(store.records().is_empty());
        assert_eq!(summary.extract_misses, 1);
    }

    #[tokio::test]
    async fn test_configured_sentinel_not_sampled() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("http://example.com/", &links_page(&["/html/a/1.html"]))
                .page("http://example.com/html/a/1.html", &detail_page("T", "S", "C")),
        );
        let config = test_config(
            1,
            r#"mode = "sample-extract"
detail-path-pattern = "/html/*.html"
sentinel-urls = ["http://example.com/html/a/1.html"]"#,
        );
        let store = Arc::new(MemoryRecordStore::new());
        let components = components(fetcher.clone(), store.clone(), &config);

        run_crawl(config, components).await;

        assert!(store.records().is_empty());
        assert_eq!(fetcher.calls("http://example.com/html/a/1.html"), 1);
    }

    #[tokio::test]
    async fn test_seed_only_when_queue_empty() {
        let config = test_config(1, "");
        let components = components(
            Arc::new(StaticFetcher::new()),
            Arc::new(MemoryRecordStore::new()),
            &config,
        );
        components.queue.push("http://example.com/joined").await.unwrap();
        let coordinator = Coordinator::with_components(config, components.clone());

        assert_eq!(coordinator.seed().await.unwrap(), 0);
        assert_eq!(components.queue.len().await.unwrap(), 1);

        coordinator.reset().await.unwrap();
        assert_eq!(coordinator.seed().await.unwrap(), 1);
        let timeout = Duration::from_millis(10);
        assert_eq!(
            components.queue.pop(timeout).await.unwrap().as_deref(),
            Some("http://example.com/")
        );
    }

    #[tokio::test]
    async fn test_reset_clears_visited() {
        let config = test_config(1, "");
        let components = components(
            Arc::new(StaticFetcher::new()),
            Arc::new(MemoryRecordStore::new()),
            &config,
        );
        components.visited.add("http://example.com/").await.unwrap();
        let coordinator = Coordinator::with_components(config, components.clone());

        coordinator.reset().await.unwrap();

        assert_eq!(components.visited.len().await.unwrap(), 0);
    }

    /// Serves an endless chain: every page links to the next one
    struct EndlessFetcher;

    #[async_trait::async_trait]
    impl Fetcher for EndlessFetcher {
        async fn fetch(&self, url: &url::Url) -> Option<String> {
            let n: u64 = url.path().trim_start_matches('/').parse().unwrap_or(0);
            Some(links_page(&[&format!("/{}", n + 1)]))
        }
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_endless_crawl() {
        let config = test_config(2, "");
        let components = components(
            Arc::new(EndlessFetcher),
            Arc::new(MemoryRecordStore::new()),
            &config,
        );
        let coordinator = Coordinator::with_components(config, components);
        let token = coordinator.shutdown_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), coordinator.run())
            .await
            .expect("cancelled crawl did not stop")
            .unwrap();

        assert!(summary.claimed > 1);
    }
}
