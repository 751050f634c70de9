//! Plain text converter

use super::{Converter, StreamInfo};
use crate::error::ConversionError;

const TEXT_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
    "application/yaml",
    "application/toml",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "json", "xml", "csv", "tsv", "yaml", "yml", "toml", "rst", "log",
];

/// Passes textual bodies through unchanged
///
/// Also the catch-all for a body without a Content-Type, as long as it is
/// valid UTF-8.
pub struct PlainTextConverter;

impl PlainTextConverter {
    /// Create a new plain text converter
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for PlainTextConverter {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn accepts(&self, info: &StreamInfo, head: &[u8]) -> bool {
        match info.mime_type.as_deref() {
            Some(mime) => {
                mime.starts_with("text/")
                    || TEXT_TYPES.contains(&mime)
                    || mime.ends_with("+json")
                    || mime.ends_with("+xml")
                    || (mime == "application/octet-stream"
                        && info.extension_is(TEXT_EXTENSIONS))
            }
            None => info.extension_is(TEXT_EXTENSIONS) || is_text(head),
        }
    }

    fn convert(&self, body: &[u8], info: &StreamInfo) -> Result<String, ConversionError> {
        Ok(info.decode_body(body))
    }
}

/// Valid UTF-8 without NUL bytes; a multi-byte char cut at the end is tolerated
fn is_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
