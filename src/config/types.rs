use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Threadweave
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How a worker processes each claimed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Follow every same-domain link
    Discover,
    /// Follow detail-page links only and sample visited pages for extraction
    SampleExtract,
}

impl Default for CrawlMode {
    fn default() -> Self {
        Self::Discover
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Size of the worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub mode: CrawlMode,

    /// Base domain (host, optionally with port) relative links resolve against
    pub domain: String,

    /// Scheme given to links that carry none
    #[serde(default = "default_scheme")]
    pub default_scheme: String,

    /// URLs pushed when the work queue starts out empty
    pub seeds: Vec<String>,

    /// Path glob recognizing detail pages, e.g. `/html/*.html`
    #[serde(default)]
    pub detail_path_pattern: Option<String>,

    /// URLs never sampled for extraction (seeds are always excluded)
    #[serde(default)]
    pub sentinel_urls: Vec<String>,

    /// How long a single blocking pop waits (milliseconds)
    #[serde(default = "default_pop_timeout_ms")]
    pub pop_timeout_ms: u64,

    /// Initial coordinator poll interval (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for the coordinator poll backoff (milliseconds)
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,

    /// Consecutive "queue empty and all idle" observations required to finish
    #[serde(default = "default_quiet_checks")]
    pub quiet_checks: u32,
}

impl CrawlerConfig {
    pub fn pop_timeout(&self) -> Duration {
        Duration::from_millis(self.pop_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Charset labels tried in order when decoding a body
    #[serde(default = "default_charsets")]
    pub charsets: Vec<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Proxy URL applied to all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Transport timeout per request (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            charsets: default_charsets(),
            user_agent: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which fetch failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryScope {
    /// Timeouts, connection failures and 5xx responses
    Transient,
    /// Every fetch error
    Any,
}

impl Default for RetryScope {
    fn default() -> Self {
        Self::Transient
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff is `base_wait_secs * (1 + U)` with U uniform in [0, 1)
    #[serde(default = "default_base_wait_secs")]
    pub base_wait_secs: f64,

    #[serde(default)]
    pub retry_on: RetryScope,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_wait_secs: default_base_wait_secs(),
            retry_on: RetryScope::default(),
        }
    }
}

/// Where the work queue and visited set live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Local,
    Redis,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Local
    }
}

/// Queue and visited-set backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_queue_key")]
    pub queue_key: String,

    #[serde(default = "default_visited_key")]
    pub visited_key: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            redis_url: default_redis_url(),
            queue_key: default_queue_key(),
            visited_key: default_visited_key(),
        }
    }
}

/// CSS selectors for the three extracted fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractConfig {
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    #[serde(default = "default_subtitle_selector")]
    pub subtitle_selector: String,

    #[serde(default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            title_selector: default_title_selector(),
            subtitle_selector: default_subtitle_selector(),
            content_selector: default_content_selector(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite records database; records stay in memory when unset
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_workers() -> usize {
    10
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_pop_timeout_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_max_poll_interval_ms() -> u64 {
    500
}

fn default_quiet_checks() -> u32 {
    2
}

fn default_charsets() -> Vec<String> {
    vec!["utf-8".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_wait_secs() -> f64 {
    5.0
}

fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}

fn default_queue_key() -> String {
    "threadweave:task".to_string()
}

fn default_visited_key() -> String {
    "threadweave:visited".to_string()
}

fn default_title_selector() -> String {
    "a[href$='/index.html']".to_string()
}

fn default_subtitle_selector() -> String {
    ".title h2".to_string()
}

fn default_content_selector() -> String {
    ".content".to_string()
}
