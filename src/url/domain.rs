use url::Url;

/// Returns the network location of a URL: lowercase host plus `:port` when
/// the port is not the scheme default
///
/// # Examples
///
/// ```
/// use url::Url;
/// use threadweave::url::netloc;
///
/// let url = Url::parse("http://M.Sohu.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("m.sohu.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Checks whether a URL lives on the given base domain
///
/// The comparison is exact: subdomains of `domain` do not match.
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    netloc(url).is_some_and(|n| n.eq_ignore_ascii_case(domain))
}
