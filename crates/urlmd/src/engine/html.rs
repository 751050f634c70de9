//! HTML converter

use super::{Converter, StreamInfo};
use crate::convert::html_to_markdown;
use crate::error::ConversionError;

const HTML_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Converts HTML documents to markdown
pub struct HtmlConverter;

impl HtmlConverter {
    /// Create a new HTML converter
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for HtmlConverter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn accepts(&self, info: &StreamInfo, head: &[u8]) -> bool {
        if info.mime_is(HTML_TYPES) {
            return true;
        }
        if info.mime_is_specific() {
            return false;
        }
        info.extension_is(HTML_EXTENSIONS) || looks_like_html(head)
    }

    fn convert(&self, body: &[u8], info: &StreamInfo) -> Result<String, ConversionError> {
        Ok(html_to_markdown(&info.decode_body(body)))
    }
}

/// Sniff the start of a body for an HTML document
fn looks_like_html(head: &[u8]) -> bool {
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{FEFF}').trim_start();
    let lower = trimmed
        .get(..trimmed.len().min(16))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}
