/// Checks if a URL path matches a glob pattern
///
/// `*` matches any run of characters, including `/`. Every other character
/// must match literally, and the whole path has to be consumed.
///
/// # Examples
///
/// ```
/// use threadweave::url::matches_path_glob;
///
/// assert!(matches_path_glob("/html/*.html", "/html/lizhi/1234.html"));
/// assert!(!matches_path_glob("/html/*.html", "/html/lizhi/"));
/// assert!(!matches_path_glob("/html/*.html", "/about.html"));
/// ```
pub fn matches_path_glob(pattern: &str, path: &str) -> bool {
    let pattern = pattern.as_bytes();
    let path = path.as_bytes();

    let (mut p, mut s) = (0, 0);
    // Position of the last `*` seen and the path index it is currently matched up to
    let mut backtrack: Option<(usize, usize)> = None;

    while s < path.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, s));
            p += 1;
        } else if p < pattern.len() && pattern[p] == path[s] {
            p += 1;
            s += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            s = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_path_glob("/about.html", "/about.html"));
        assert!(!matches_path_glob("/about.html", "/about.htm"));
        assert!(!matches_path_glob("/about.html", "/about.html/x"));
    }

    #[test]
    fn test_detail_page_pattern() {
        let pattern = "/html/*.html";

        assert!(matches_path_glob(pattern, "/html/1.html"));
        assert!(matches_path_glob(pattern, "/html/mingyan/20170823/1.html"));
        assert!(matches_path_glob(pattern, "/html/.html"));

        assert!(!matches_path_glob(pattern, "/index.html"));
        assert!(!matches_path_glob(pattern, "/html/1.htm"));
        assert!(!matches_path_glob(pattern, "/html/1.html.bak"));
        assert!(!matches_path_glob(pattern, "/static/html/1.html"));
    }

    #[test]
    fn test_star_backtracks_over_repeated_suffix() {
        assert!(matches_path_glob("/*.html", "/a.html.html"));
        assert!(matches_path_glob("/a*b*c", "/a-b-b-c"));
        assert!(!matches_path_glob("/a*b*c", "/a-b-b-d"));
    }

    #[test]
    fn test_trailing_and_lone_stars() {
        assert!(matches_path_glob("*", ""));
        assert!(matches_path_glob("*", "/anything/at/all"));
        assert!(matches_path_glob("/news/*", "/news/"));
        assert!(matches_path_glob("/news/**", "/news/a/b"));
        assert!(!matches_path_glob("/news/*", "/new"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(matches_path_glob("", ""));
        assert!(!matches_path_glob("", "/"));
        assert!(!matches_path_glob("/", ""));
    }
}
