//! Output module for crawl statistics and summaries
//!
//! This module handles:
//! - Live crawl counters shared by the workers
//! - Printing the end-of-crawl summary

pub mod stats;

pub use stats::{print_summary, CrawlStats, CrawlSummary};
