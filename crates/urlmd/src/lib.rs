//! urlmd - URL to markdown HTTP gateway
//!
//! This crate serves a single endpoint: the request path carries a URL,
//! the gateway fetches it and answers with its content as markdown or
//! plain text.
//!
//! ## Pipeline
//!
//! Every request walks the same linear pipeline:
//!
//! 1. [`path`] - take the raw path + query and percent-decode it
//! 2. [`normalize`] - repair the scheme separator, default to `https://`
//! 3. [`Invoker`] - run the blocking [`ConversionEngine`] off the async
//!    workers, bounded by [`CONVERSION_TIMEOUT`]
//! 4. [`server`] - map the typed outcome to exactly one HTTP response
//!
//! ## Conversion engine
//!
//! The engine is pluggable. [`HttpEngine`] is the built-in one: it fetches
//! the URL and hands the body to the first matching converter in a
//! [`ConverterRegistry`]:
//! - [`HtmlConverter`] - HTML to markdown
//! - [`PlainTextConverter`] - text, JSON, XML passthrough
//! - `PdfConverter` - PDF text extraction (feature `pdf`)

mod convert;
pub mod engine;
mod error;
mod gateway;
mod invoke;
pub mod normalize;
pub mod path;
pub mod server;

use std::time::Duration;

pub use convert::html_to_markdown;
pub use engine::{
    ConversionEngine, Converter, ConverterRegistry, HtmlConverter, HttpEngine,
    PlainTextConverter, StreamInfo,
};
#[cfg(feature = "pdf")]
pub use engine::PdfConverter;
pub use error::{ConversionError, GatewayError};
pub use gateway::{Gateway, GatewayBuilder};
pub use invoke::Invoker;
pub use normalize::normalize_url;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "urlmd/0.1";

/// Wall-clock budget for a single conversion, measured from invocation start
pub const CONVERSION_TIMEOUT: Duration = Duration::from_secs(25);

/// Body returned for a request with an empty path
pub const USAGE_MESSAGE: &str =
    "Welcome to URL to Markdown API\nUsage: https://markdown.nimk.ir/YOUR_URL";
