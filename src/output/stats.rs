//! Crawl statistics collection and display
//!
//! Workers bump the shared [`CrawlStats`] counters as they go; the
//! coordinator freezes them into a [`CrawlSummary`] once the crawl is done.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every worker
#[derive(Debug, Default)]
pub struct CrawlStats {
    /// Units of work taken off the queue
    pub popped: AtomicU64,

    /// Popped URLs this process claimed in the visited set
    pub claimed: AtomicU64,

    /// Popped URLs someone had already claimed
    pub skipped: AtomicU64,

    /// Fetches that produced a page
    pub fetched: AtomicU64,

    /// Fetches that produced nothing
    pub fetch_failures: AtomicU64,

    /// Links pushed onto the work queue
    pub enqueued: AtomicU64,

    /// URLs drawn from the sample pool for extraction
    pub sampled: AtomicU64,

    /// Records written to the store
    pub records_stored: AtomicU64,

    /// Sampled pages missing a required field
    pub extract_misses: AtomicU64,

    /// Store calls that failed
    pub store_failures: AtomicU64,

    /// Queue or visited-set calls that failed
    pub backend_errors: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

/// Frozen view of one finished crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub popped: u64,
    pub claimed: u64,
    pub skipped: u64,
    pub fetched: u64,
    pub fetch_failures: u64,
    pub enqueued: u64,
    pub sampled: u64,
    pub records_stored: u64,
    pub extract_misses: u64,
    pub store_failures: u64,
    pub backend_errors: u64,

    /// Visited-set size when the crawl finished
    pub visited: usize,
}

impl CrawlSummary {
    /// Snapshots `stats` into a summary
    pub fn from_stats(
        stats: &CrawlStats,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        workers: usize,
        visited: usize,
    ) -> Self {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        Self {
            started_at,
            finished_at,
            workers,
            popped: load(&stats.popped),
            claimed: load(&stats.claimed),
            skipped: load(&stats.skipped),
            fetched: load(&stats.fetched),
            fetch_failures: load(&stats.fetch_failures),
            enqueued: load(&stats.enqueued),
            sampled: load(&stats.sampled),
            records_stored: load(&stats.records_stored),
            extract_misses: load(&stats.extract_misses),
            store_failures: load(&stats.store_failures),
            backend_errors: load(&stats.backend_errors),
            visited,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Workers: {}", summary.workers);
    println!("  Visited URLs: {}", summary.visited);
    println!();

    println!("Work:");
    println!("  Popped: {}", summary.popped);
    println!("  Claimed: {}", summary.claimed);
    println!("  Already claimed: {}", summary.skipped);
    println!("  Links enqueued: {}", summary.enqueued);
    println!();

    println!("Fetches:");
    let attempted = summary.fetched + summary.fetch_failures;
    let success_rate = if attempted > 0 {
        (summary.fetched as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  Succeeded: {} / {} ({:.1}%)",
        summary.fetched, attempted, success_rate
    );
    println!();

    if summary.sampled > 0 || summary.records_stored > 0 {
        println!("Extraction:");
        println!("  Sampled: {}", summary.sampled);
        println!("  Records stored: {}", summary.records_stored);
        println!("  Missing fields: {}", summary.extract_misses);
        println!();
    }

    if summary.store_failures > 0 || summary.backend_errors > 0 {
        println!("Errors:");
        println!("  Store failures: {}", summary.store_failures);
        println!("  Backend errors: {}", summary.backend_errors);
        println!();
    }
}
