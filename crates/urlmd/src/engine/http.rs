//! Default HTTP engine
//!
//! Fetches the URL with a blocking reqwest client and hands the body to a
//! [`ConverterRegistry`].

use super::{ConversionEngine, ConverterRegistry, StreamInfo};
use crate::error::ConversionError;
use crate::{CONVERSION_TIMEOUT, DEFAULT_USER_AGENT};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Connect timeout for the upstream request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest body the engine will read
pub const DEFAULT_MAX_BODY_BYTES: u64 = 20 * 1024 * 1024;

/// Accept header sent upstream
const ACCEPT_VALUE: &str = "text/markdown, text/html;q=0.9, text/plain;q=0.8, */*;q=0.5";

/// Fetches a URL over HTTP(S) and converts the body
///
/// A client is built per call, so the engine itself holds no connections
/// and can be constructed inside an async context.
pub struct HttpEngine {
    user_agent: String,
    timeout: Duration,
    max_body_bytes: u64,
    registry: ConverterRegistry,
}

impl HttpEngine {
    /// Create an engine with the default converters
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: CONVERSION_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            registry: ConverterRegistry::with_defaults(),
        }
    }

    /// Set the User-Agent sent upstream
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the overall upstream request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the largest body the engine will read
    pub fn max_body_bytes(mut self, max: u64) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Replace the converter registry
    pub fn registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn client(&self) -> Result<Client, ConversionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConversionError::Other(format!("Failed to create HTTP client: {}", e)))
    }

    fn body_too_large(&self) -> ConversionError {
        ConversionError::ConversionFailed(format!(
            "Response body exceeds {} bytes",
            self.max_body_bytes
        ))
    }
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine for HttpEngine {
    fn name(&self) -> &'static str {
        "http"
    }

    fn convert(&self, url: &str) -> Result<String, ConversionError> {
        let client = self.client()?;
        let response = client
            .get(url)
            .send()
            .map_err(ConversionError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConversionError::ConversionFailed(format!(
                "Upstream returned HTTP {}",
                status
            )));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length: Option<u64> = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        if content_length.is_some_and(|len| len > self.max_body_bytes) {
            return Err(self.body_too_large());
        }

        let info = StreamInfo::new(response.url().as_str(), content_type.as_deref());
        debug!(url = %info.url, mime = ?info.mime_type, "Fetched resource");

        let mut body = Vec::new();
        response
            .take(self.max_body_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|e| {
                ConversionError::ConversionFailed(format!("Failed to read response body: {}", e))
            })?;
        if body.len() as u64 > self.max_body_bytes {
            return Err(self.body_too_large());
        }

        self.registry.convert(&body, &info)
    }
}
