//! Extraction of the target URL from a request path

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use tracing::info;

/// Raw (undecoded) target carried by the request
///
/// Everything after the leading `/`, plus `?` and the raw query when the
/// query is non-empty.
pub fn raw_target(uri: &Uri) -> String {
    let path = uri.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

/// Percent-decode a raw target into a candidate URL
///
/// `+` is kept literally. Malformed escapes such as `%zz` pass through
/// unchanged and invalid UTF-8 is replaced with U+FFFD.
pub fn decode_target(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    info!(raw = %raw, decoded = %decoded, "Decoded URL");
    decoded
}
