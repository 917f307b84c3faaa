use crate::config::types::{
    BackendConfig, BackendKind, Config, CrawlMode, CrawlerConfig, ExtractConfig, FetchConfig,
    RetryConfig,
};
use crate::ConfigError;
use encoding_rs::Encoding;
use scraper::Selector;
use url::Url;

/// Upper bound on the retry base wait, in seconds
const MAX_BASE_WAIT_SECS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_retry_config(&config.retry)?;
    validate_backend_config(&config.backend)?;
    validate_extract_config(&config.extract)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    validate_domain(&config.domain)?;

    if config.default_scheme != "http" && config.default_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "default_scheme must be 'http' or 'https', got '{}'",
            config.default_scheme
        )));
    }

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in config.seeds.iter().chain(config.sentinel_urls.iter()) {
        validate_absolute_url(seed)?;
    }

    match (&config.mode, &config.detail_path_pattern) {
        (CrawlMode::SampleExtract, None) => {
            return Err(ConfigError::Validation(
                "sample-extract mode requires detail_path_pattern".to_string(),
            ));
        }
        (_, Some(pattern)) if !pattern.starts_with('/') => {
            return Err(ConfigError::Validation(format!(
                "detail_path_pattern must start with '/', got '{}'",
                pattern
            )));
        }
        _ => {}
    }

    if config.pop_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "pop_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 || config.poll_interval_ms > config.max_poll_interval_ms {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 1 and <= max_poll_interval_ms ({}), got {}",
            config.max_poll_interval_ms, config.poll_interval_ms
        )));
    }

    if config.quiet_checks < 1 {
        return Err(ConfigError::Validation(
            "quiet_checks must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.charsets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one charset is required".to_string(),
        ));
    }

    for label in &config.charsets {
        if Encoding::for_label(label.as_bytes()).is_none() {
            return Err(ConfigError::UnknownCharset(label.clone()));
        }
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.base_wait_secs.is_finite()
        || config.base_wait_secs < 0.0
        || config.base_wait_secs > MAX_BASE_WAIT_SECS
    {
        return Err(ConfigError::Validation(format!(
            "base_wait_secs must be between 0 and {}, got {}",
            MAX_BASE_WAIT_SECS, config.base_wait_secs
        )));
    }

    Ok(())
}

/// Validates backend configuration
fn validate_backend_config(config: &BackendConfig) -> Result<(), ConfigError> {
    if config.queue_key.is_empty() || config.visited_key.is_empty() {
        return Err(ConfigError::Validation(
            "queue_key and visited_key cannot be empty".to_string(),
        ));
    }

    if config.queue_key == config.visited_key {
        return Err(ConfigError::Validation(format!(
            "queue_key and visited_key must differ, both are '{}'",
            config.queue_key
        )));
    }

    if config.kind == BackendKind::Redis {
        let url = Url::parse(&config.redis_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid redis_url '{}': {}", config.redis_url, e))
        })?;
        if !matches!(url.scheme(), "redis" | "rediss" | "redis+unix" | "unix") {
            return Err(ConfigError::InvalidUrl(format!(
                "redis_url must use a redis scheme, got '{}'",
                url.scheme()
            )));
        }
    }

    Ok(())
}

/// Validates extraction selectors
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.title_selector,
        &config.subtitle_selector,
        &config.content_selector,
    ] {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: format!("{:?}", e),
        })?;
    }
    Ok(())
}

/// Validates an absolute http(s) URL
fn validate_absolute_url(raw: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", raw)));
    }

    Ok(())
}

/// Validates a base domain, optionally carrying a `:port` suffix
fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    let host = match domain.rsplit_once(':') {
        Some((host, port)) => {
            port.parse::<u16>().map_err(|_| {
                ConfigError::InvalidDomain(format!("'{}' has an invalid port", domain))
            })?;
            host
        }
        None => domain,
    };

    if host.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') && host != "localhost" {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            host
        )));
    }

    Ok(())
}
