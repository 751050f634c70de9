//! Conversion engine: fetch a URL and turn its body into text
//!
//! Design: the engine is a blocking collaborator behind [`ConversionEngine`].
//! [`HttpEngine`] fetches the resource and dispatches the body to the first
//! [`Converter`] in a [`ConverterRegistry`] that accepts it.

mod html;
mod http;
#[cfg(feature = "pdf")]
mod pdf;
mod plain;

pub use html::HtmlConverter;
pub use http::HttpEngine;
#[cfg(feature = "pdf")]
pub use pdf::PdfConverter;
pub use plain::PlainTextConverter;

use crate::error::ConversionError;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// Mime types too vague to rule a format out
const GENERIC_TYPES: &[&str] = &["text/plain", "application/octet-stream"];

/// A synchronous URL-to-text engine
///
/// Implementations may block on network and parsing; callers are expected
/// to run them off the async workers (see [`Invoker`](crate::Invoker)).
pub trait ConversionEngine: Send + Sync {
    /// Unique identifier for this engine (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch `url` and return its text content
    fn convert(&self, url: &str) -> Result<String, ConversionError>;
}

/// What is known about a fetched body before conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// Final URL after redirects
    pub url: String,
    /// Lowercased mime essence, e.g. `text/html`
    pub mime_type: Option<String>,
    /// Charset parameter of the Content-Type header
    pub charset: Option<String>,
    /// Lowercased file extension of the URL path, without the dot
    pub extension: Option<String>,
}

impl StreamInfo {
    /// Build stream info from a URL and an optional Content-Type header value
    pub fn new(url: impl Into<String>, content_type: Option<&str>) -> Self {
        let url = url.into();
        let (mime_type, charset) = match content_type {
            Some(ct) => parse_content_type(ct),
            None => (None, None),
        };
        let extension = extension_from_url(&url);
        Self {
            url,
            mime_type,
            charset,
            extension,
        }
    }

    /// True when the mime type equals one of `types`
    pub fn mime_is(&self, types: &[&str]) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| types.contains(&mime))
    }

    /// True when the mime type starts with `prefix`
    pub fn mime_starts_with(&self, prefix: &str) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with(prefix))
    }

    /// True when the URL extension equals one of `extensions`
    pub fn extension_is(&self, extensions: &[&str]) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| extensions.contains(&ext))
    }

    /// True when the mime type is present and more specific than text or bytes
    pub fn mime_is_specific(&self) -> bool {
        self.mime_type.is_some() && !self.mime_is(GENERIC_TYPES)
    }

    /// Decode a body using the declared charset
    ///
    /// Unknown or missing charsets fall back to UTF-8. A byte order mark
    /// overrides the declared charset and is stripped.
    pub fn decode_body(&self, body: &[u8]) -> String {
        let encoding = self
            .charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(body);
        text.into_owned()
    }

    /// Description used in unsupported-format messages
    fn describe(&self) -> String {
        match (&self.mime_type, &self.extension) {
            (Some(mime), _) => format!("content type '{}'", mime),
            (None, Some(ext)) => format!("file extension '.{}'", ext),
            (None, None) => "unknown content type".to_string(),
        }
    }
}

/// Split `text/html; charset=UTF-8` into `("text/html", "utf-8")`
fn parse_content_type(value: &str) -> (Option<String>, Option<String>) {
    let mut parts = value.split(';');
    let mime = parts
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());
    let charset = parts.find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_ascii_lowercase())
    });
    (mime, charset)
}

/// Extension of the last path segment, if it has one
fn extension_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Converts one family of formats to text
pub trait Converter: Send + Sync {
    /// Unique identifier for this converter (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Returns true if this converter handles the body
    ///
    /// `head` is the start of the body, for magic-byte sniffing.
    fn accepts(&self, info: &StreamInfo, head: &[u8]) -> bool;

    /// Convert the full body; called only if `accepts()` returned true
    fn convert(&self, body: &[u8], info: &StreamInfo) -> Result<String, ConversionError>;
}

/// Ordered list of converters; the first one that accepts a body wins
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Create a registry with the built-in converters
    ///
    /// Order: PDF (when enabled), HTML, then plain text as the textual
    /// catch-all.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        #[cfg(feature = "pdf")]
        registry.register(Box::new(PdfConverter::new()));
        registry.register(Box::new(HtmlConverter::new()));
        registry.register(Box::new(PlainTextConverter::new()));
        registry
    }

    /// Register a converter; earlier registrations take priority
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    /// Convert a body with the first accepting converter
    pub fn convert(&self, body: &[u8], info: &StreamInfo) -> Result<String, ConversionError> {
        let head = &body[..body.len().min(512)];
        for converter in &self.converters {
            if converter.accepts(info, head) {
                debug!(converter = converter.name(), url = %info.url, "Using converter");
                return converter.convert(body, info);
            }
        }

        Err(ConversionError::UnsupportedFormat(format!(
            "no converter for {}",
            info.describe()
        )))
    }
}
