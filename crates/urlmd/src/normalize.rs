//! URL normalization
//!
//! Clients and proxies often collapse `//` in a path, so a URL embedded as
//! `/https://example.com` can arrive as `https:/example.com`. Normalization
//! repairs that separator and defaults schemeless input to `https://`.

/// Schemes the gateway fetches
const SCHEMES: &[&str] = &["https", "http"];

/// Normalize a decoded URL so it starts with `http://` or `https://`
///
/// - `http:/example.com` and `http:example.com` become `http://example.com`
/// - a missing scheme (`example.com`, `www.example.com`) gets `https://`
///
/// Never fails; the output of any input starts with one of the two schemes.
pub fn normalize_url(url: &str) -> String {
    let repaired = repair_scheme_separator(url);
    if has_accepted_scheme(&repaired) {
        repaired
    } else {
        format!("https://{}", repaired)
    }
}

/// True when `url` starts with `http://` or `https://`
pub fn has_accepted_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Rewrite `scheme:` or `scheme:/` (not followed by another `/`) to `scheme://`
fn repair_scheme_separator(url: &str) -> String {
    for scheme in SCHEMES {
        let Some(rest) = url
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix(':'))
        else {
            continue;
        };

        if rest.starts_with("//") {
            return url.to_string();
        }
        let host = rest.strip_prefix('/').unwrap_or(rest);
        return format!("{}://{}", scheme, host);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_single_slash() {
        assert_eq!(normalize_url("http:/example.com"), "http://example.com");
        assert_eq!(normalize_url("https:/example.com/a/b"), "https://example.com/a/b");
    }

    #[test]
    fn test_repairs_missing_slashes() {
        assert_eq!(normalize_url("http:example.com"), "http://example.com");
        assert_eq!(normalize_url("https:example.com"), "https://example.com");
    }

    #[test]
    fn test_adds_default_scheme() {
        assert_eq!(normalize_url("www.example.com"), "https://www.example.com");
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("example.com/path?q=1"), "https://example.com/path?q=1");
    }

    #[test]
    fn test_keeps_well_formed_urls() {
        assert_eq!(normalize_url("https://already.ok"), "https://already.ok");
        assert_eq!(normalize_url("http://already.ok/x"), "http://already.ok/x");
        assert_eq!(normalize_url("https:///triple"), "https:///triple");
    }

    #[test]
    fn test_scheme_only_inputs() {
        assert_eq!(normalize_url(""), "https://");
        assert_eq!(normalize_url("http:"), "http://");
        assert_eq!(normalize_url("https:/"), "https://");
    }

    #[test]
    fn test_scheme_match_is_case_sensitive() {
        assert_eq!(normalize_url("HTTP:/example.com"), "https://HTTP:/example.com");
    }

    #[test]
    fn test_other_schemes_get_prefixed() {
        assert_eq!(normalize_url("ftp://example.com"), "https://ftp://example.com");
        assert_eq!(normalize_url("httpx:/a"), "https://httpx:/a");
    }

    #[test]
    fn test_output_always_has_scheme_and_is_idempotent() {
        let inputs = [
            "",
            "/",
            "//",
            "http",
            "https",
            "http:",
            "http:/",
            "http://",
            "https:/x",
            "www.example.com",
            "example.com",
            "HTTPS://Example.com",
            "mailto:someone@example.com",
            "https://already.ok",
            "  spaced  ",
            "ünïcödé.example",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert!(has_accepted_scheme(&once), "{input:?} -> {once:?}");
            assert_eq!(normalize_url(&once), once, "not idempotent for {input:?}");
        }
    }
}
