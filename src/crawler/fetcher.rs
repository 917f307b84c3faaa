//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and proxy
//! - Classifying failures as transient or permanent
//! - Retrying transient failures through a [`RetryPolicy`]
//! - Decoding response bodies against an ordered charset list

use crate::config::{FetchConfig, RetryScope};
use crate::crawler::retry::RetryPolicy;
use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failures a single fetch attempt can report
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error: HTTP {status}")]
    ServerError { status: u16 },
}

impl FetchError {
    /// Timeouts, connection failures, broken bodies and 5xx responses
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::ServerError { .. } => true,
        }
    }
}

/// Capability: retrieve a page as decoded text
///
/// `None` covers every way a page can be absent: non-200 status, exhausted
/// retries, permanent transport failure or undecodable body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Option<String>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Bad proxy URL or TLS backend failure
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Resolves charset labels to encodings, skipping unknown ones
pub fn resolve_charsets(labels: &[String]) -> Vec<&'static Encoding> {
    labels
        .iter()
        .filter_map(|label| Encoding::for_label(label.trim().as_bytes()))
        .collect()
}

/// Decodes a body with the first charset that accepts it without errors
///
/// Returns `None` when every charset rejects the bytes.
pub fn decode_page(bytes: &[u8], charsets: &[&'static Encoding]) -> Option<String> {
    charsets.iter().find_map(|encoding| {
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    })
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    charsets: Vec<&'static Encoding>,
    policy: RetryPolicy,
    scope: RetryScope,
}

impl HttpFetcher {
    pub fn new(
        client: Client,
        charsets: Vec<&'static Encoding>,
        policy: RetryPolicy,
        scope: RetryScope,
    ) -> Self {
        Self {
            client,
            charsets,
            policy,
            scope,
        }
    }

    /// Builds a fetcher from the fetch config and the retry settings
    pub fn from_config(
        config: &FetchConfig,
        policy: RetryPolicy,
        scope: RetryScope,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            resolve_charsets(&config.charsets),
            policy,
            scope,
        ))
    }

    /// One request; `Ok(None)` for statuses that mean "no page"
    async fn attempt(&self, url: &Url) -> Result<Option<Vec<u8>>, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if status.is_server_error() {
            return Err(FetchError::ServerError {
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            tracing::debug!("{} returned HTTP {}", url, status.as_u16());
            return Ok(None);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Option<String> {
        let scope = self.scope;
        let outcome = self
            .policy
            .run(
                || self.attempt(url),
                |e: &FetchError| scope == RetryScope::Any || e.is_transient(),
            )
            .await;

        let bytes = match outcome {
            Ok(Some(Some(bytes))) => bytes,
            Ok(Some(None)) => return None,
            Ok(None) => {
                tracing::warn!("Giving up on {} after {} attempts", url, self.policy.max_attempts());
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        let text = decode_page(&bytes, &self.charsets);
        if text.is_none() {
            tracing::warn!("Could not decode {} with any configured charset", url);
        }
        text
    }
}
