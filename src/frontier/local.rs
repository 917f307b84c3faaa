//! In-process frontier backends
//!
//! Both structures guard their state with a mutex held only for the duration
//! of a single operation, never across an await point.

use crate::frontier::traits::{FrontierResult, VisitedSet, WorkQueue};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

/// Thread-safe FIFO queue with a blocking pop
#[derive(Debug, Default)]
pub struct LocalQueue {
    items: Mutex<VecDeque<String>>,
    available: Notify,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WorkQueue for LocalQueue {
    async fn push(&self, url: &str) -> FrontierResult<()> {
        self.items().push_back(url.to_string());
        self.available.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> FrontierResult<Option<String>> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking so a push between the check
            // and the wait is not missed
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = self.items().pop_front();
            if next.is_some() {
                return Ok(next);
            }

            if timeout_at(deadline, notified).await.is_err() {
                return Ok(self.items().pop_front());
            }
        }
    }

    async fn len(&self) -> FrontierResult<usize> {
        Ok(self.items().len())
    }

    async fn clear(&self) -> FrontierResult<()> {
        self.items().clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct VisitedInner {
    members: HashSet<String>,
    sample_pool: Vec<String>,
}

/// Thread-safe visited set with an atomic test-and-insert
#[derive(Debug, Default)]
pub struct LocalVisitedSet {
    inner: Mutex<VisitedInner>,
}

impl LocalVisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, VisitedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl VisitedSet for LocalVisitedSet {
    async fn contains(&self, url: &str) -> FrontierResult<bool> {
        Ok(self.inner().members.contains(url))
    }

    async fn add(&self, url: &str) -> FrontierResult<bool> {
        let mut inner = self.inner();
        if inner.members.insert(url.to_string()) {
            inner.sample_pool.push(url.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn pop_arbitrary(&self) -> FrontierResult<Option<String>> {
        let mut inner = self.inner();
        if inner.sample_pool.is_empty() {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..inner.sample_pool.len());
        Ok(Some(inner.sample_pool.swap_remove(index)))
    }

    async fn len(&self) -> FrontierResult<usize> {
        Ok(self.inner().members.len())
    }

    async fn clear(&self) -> FrontierResult<()> {
        let mut inner = self.inner();
        inner.members.clear();
        inner.sample_pool.clear();
        Ok(())
    }
}
