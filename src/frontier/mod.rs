//! Frontier module: the shared work queue and visited set
//!
//! This module handles:
//! - The `WorkQueue` / `VisitedSet` capability traits
//! - In-process backends for single-process crawls
//! - Redis backends so independent processes can cooperate on one crawl
//! - Building the configured backend pair

mod local;
mod remote;
mod traits;

pub use remote::{connect as connect_redis, RedisQueue, RedisVisitedSet};
pub use local::{LocalQueue, LocalVisitedSet};
pub use traits::{FrontierError, FrontierResult, VisitedSet, WorkQueue};

use crate::config::{BackendConfig, BackendKind};
use std::sync::Arc;

/// Builds the work queue and visited set described by the backend config
///
/// # Returns
///
/// * `Ok((queue, visited))` - Backends ready for use
/// * `Err(FrontierError)` - Redis was selected and could not be reached
pub async fn open_frontier(
    config: &BackendConfig,
) -> FrontierResult<(Arc<dyn WorkQueue>, Arc<dyn VisitedSet>)> {
    match config.kind {
        BackendKind::Local => {
            tracing::info!("Using in-process work queue and visited set");
            Ok((
                Arc::new(LocalQueue::new()),
                Arc::new(LocalVisitedSet::new()),
            ))
        }
        BackendKind::Redis => {
            let conn = connect_redis(&config.redis_url).await?;
            tracing::info!(
                "Using Redis list '{}' and set '{}'",
                config.queue_key,
                config.visited_key
            );
            Ok((
                Arc::new(RedisQueue::new(conn.clone(), config.queue_key.clone())),
                Arc::new(RedisVisitedSet::new(conn, config.visited_key.clone())),
            ))
        }
    }
}
