//! Redis-backed frontier for crawls shared across processes
//!
//! The queue is a Redis list (`RPUSH` / `LPOP`) and the visited set is a Redis
//! set plus a companion `<key>:sample` set forming the sample pool. All
//! workers share one multiplexed connection, so the queue busy-polls `LPOP`
//! with a short backoff instead of issuing a blocking `BLPOP` that would
//! stall every other command on the connection.

use crate::frontier::traits::{FrontierResult, VisitedSet, WorkQueue};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::Instant;

/// Inserts into the member set and, only when newly added, into the sample pool
const SCRIPT_ADD_IF_ABSENT: &str = r"
    if redis.call('SADD', KEYS[1], ARGV[1]) == 1 then
        redis.call('SADD', KEYS[2], ARGV[1])
        return 1
    end
    return 0
";

const POLL_START: Duration = Duration::from_millis(10);
const POLL_MAX: Duration = Duration::from_millis(200);

/// Opens a multiplexed connection to the given Redis URL
pub async fn connect(redis_url: &str) -> FrontierResult<MultiplexedConnection> {
    let client = redis::Client::open(redis_url)?;
    let conn = client.get_multiplexed_async_connection().await?;
    tracing::info!("Connected to Redis at {}", redis_url);
    Ok(conn)
}

/// Work queue stored in a Redis list
#[derive(Clone)]
pub struct RedisQueue {
    conn: MultiplexedConnection,
    key: String,
}

impl RedisQueue {
    pub fn new(conn: MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }
}

#[async_trait]
impl WorkQueue for RedisQueue {
    async fn push(&self, url: &str) -> FrontierResult<()> {
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&self.key, url).await?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> FrontierResult<Option<String>> {
        let mut conn = self.conn.clone();
        let deadline = Instant::now() + timeout;
        let mut wait = POLL_START;

        loop {
            let item: Option<String> = redis::cmd("LPOP")
                .arg(&self.key)
                .query_async(&mut conn)
                .await?;
            if item.is_some() {
                return Ok(item);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(wait.min(deadline - now)).await;
            wait = (wait * 2).min(POLL_MAX);
        }
    }

    async fn len(&self) -> FrontierResult<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(&self.key).await?)
    }

    async fn clear(&self) -> FrontierResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&self.key).await?;
        Ok(())
    }
}

/// Visited set stored in a Redis set with a companion sample-pool set
#[derive(Clone)]
pub struct RedisVisitedSet {
    conn: MultiplexedConnection,
    key: String,
    sample_key: String,
    add_script: redis::Script,
}

impl RedisVisitedSet {
    pub fn new(conn: MultiplexedConnection, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            conn,
            sample_key: sample_key_for(&key),
            key,
            add_script: redis::Script::new(SCRIPT_ADD_IF_ABSENT),
        }
    }
}

fn sample_key_for(key: &str) -> String {
    format!("{}:sample", key)
}

#[async_trait]
impl VisitedSet for RedisVisitedSet {
    async fn contains(&self, url: &str) -> FrontierResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.sismember(&self.key, url).await?)
    }

    async fn add(&self, url: &str) -> FrontierResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = self
            .add_script
            .key(&self.key)
            .key(&self.sample_key)
            .arg(url)
            .invoke_async(&mut conn)
            .await?;
        Ok(added == 1)
    }

    async fn pop_arbitrary(&self) -> FrontierResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.spop(&self.sample_key).await?)
    }

    async fn len(&self) -> FrontierResult<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.scard(&self.key).await?)
    }

    async fn clear(&self) -> FrontierResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(vec![self.key.as_str(), self.sample_key.as_str()])
            .await?;
        Ok(())
    }
}
