//! Frontier traits and error types
//!
//! This module defines the capability interfaces shared by every work queue
//! and visited-set backend, and the error type they report.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to a queue or visited-set backend
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// FIFO queue of pending URLs shared by all workers
///
/// Implementations must tolerate concurrent `push` and `pop` from any number
/// of workers without losing or duplicating entries.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Appends a URL at the tail of the queue
    async fn push(&self, url: &str) -> FrontierResult<()>;

    /// Removes the URL at the head of the queue
    ///
    /// Waits up to `timeout` for an entry to appear and returns `Ok(None)` if
    /// none did.
    async fn pop(&self, timeout: Duration) -> FrontierResult<Option<String>>;

    /// Number of queued URLs
    async fn len(&self) -> FrontierResult<usize>;

    async fn is_empty(&self) -> FrontierResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drops every queued URL
    async fn clear(&self) -> FrontierResult<()>;
}

/// Set of URLs that have been claimed by some worker
///
/// Alongside membership the set keeps a sample pool: every URL added is also
/// placed in the pool once, and [`VisitedSet::pop_arbitrary`] drains it.
/// Draining the pool never removes membership.
#[async_trait]
pub trait VisitedSet: Send + Sync {
    async fn contains(&self, url: &str) -> FrontierResult<bool>;

    /// Atomically inserts a URL if absent
    ///
    /// Returns `true` when this call inserted it, which is what makes the
    /// caller the URL's single claimant.
    async fn add(&self, url: &str) -> FrontierResult<bool>;

    /// Removes and returns one arbitrary URL from the sample pool
    async fn pop_arbitrary(&self) -> FrontierResult<Option<String>>;

    /// Number of member URLs
    async fn len(&self) -> FrontierResult<usize>;

    /// Forgets every member and empties the sample pool
    async fn clear(&self) -> FrontierResult<()>;
}
