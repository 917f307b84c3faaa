//! State module for tracking worker activity
//!
//! This module provides the per-worker status the coordinator samples to
//! decide when a crawl has finished.
//!
//! # Components
//!
//! - `SpiderStatus`: Idle or Working
//! - `StatusCell`: atomic slot holding one worker's status

mod spider_status;

pub use spider_status::{SpiderStatus, StatusCell};
