use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form stored in the work queue and visited set
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Require an `http` or `https` scheme
/// 3. Require a host (lowercased by the parser)
/// 4. Remove fragment (everything after #)
/// 5. Remove an empty query string (trailing ?)
///
/// Path and query are otherwise kept as-is: two URLs differing only in query
/// parameters are distinct pages.
///
/// # Examples
///
/// ```
/// use threadweave::url::normalize_url;
///
/// let url = normalize_url("http://M.SOHU.COM/a/b?id=3#top").unwrap();
/// assert_eq!(url.as_str(), "http://m.sohu.com/a/b?id=3");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&mut url)?;
    Ok(url)
}

/// Applies the same normalization to an already parsed URL in place
pub fn normalize_parsed(url: &mut Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(())
}
