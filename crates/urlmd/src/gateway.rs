//! Gateway builder and the decode → normalize → convert pipeline

use crate::engine::{ConversionEngine, HttpEngine};
use crate::error::GatewayError;
use crate::invoke::Invoker;
use crate::normalize::normalize_url;
use crate::CONVERSION_TIMEOUT;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Upstream requests time out this long after the conversion deadline, so a
/// slow upstream surfaces as a conversion timeout
const UPSTREAM_GRACE: Duration = Duration::from_secs(5);

/// Builder for configuring a [`Gateway`]
#[derive(Clone)]
pub struct GatewayBuilder {
    engine: Option<Arc<dyn ConversionEngine>>,
    timeout: Duration,
    user_agent: Option<String>,
    allow_prefixes: Vec<String>,
    block_prefixes: Vec<String>,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayBuilder {
    /// Create a builder with the default engine and a 25 second deadline
    pub fn new() -> Self {
        Self {
            engine: None,
            timeout: CONVERSION_TIMEOUT,
            user_agent: None,
            allow_prefixes: Vec::new(),
            block_prefixes: Vec::new(),
        }
    }

    /// Use a custom conversion engine instead of [`HttpEngine`]
    pub fn engine(mut self, engine: Arc<dyn ConversionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the conversion deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom User-Agent for the default engine
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Add URL prefix to allow list
    pub fn allow_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allow_prefixes.push(prefix.into());
        self
    }

    /// Add URL prefix to block list
    pub fn block_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.block_prefixes.push(prefix.into());
        self
    }

    /// Build the gateway
    pub fn build(self) -> Gateway {
        let timeout = self.timeout;
        let user_agent = self.user_agent;
        let engine = self.engine.unwrap_or_else(|| {
            let mut engine = HttpEngine::new().timeout(timeout + UPSTREAM_GRACE);
            if let Some(ua) = user_agent {
                engine = engine.user_agent(ua);
            }
            Arc::new(engine)
        });

        Gateway {
            invoker: Invoker::new(engine).with_timeout(timeout),
            allow_prefixes: Arc::new(self.allow_prefixes),
            block_prefixes: Arc::new(self.block_prefixes),
        }
    }
}

/// Configured gateway; cheap to clone, shared by every request
#[derive(Clone)]
pub struct Gateway {
    invoker: Invoker,
    allow_prefixes: Arc<Vec<String>>,
    block_prefixes: Arc<Vec<String>>,
}

impl Default for Gateway {
    fn default() -> Self {
        GatewayBuilder::new().build()
    }
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// The invoker wrapping the conversion engine
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// HTTP router serving `/healthz` and the conversion endpoint
    pub fn router(&self) -> Router {
        crate::server::router(self.clone())
    }

    /// Normalize a decoded URL and check it may be fetched
    pub fn prepare(&self, candidate: &str) -> Result<String, GatewayError> {
        let normalized = normalize_url(candidate);
        info!(url = %normalized, "Normalized URL");

        let parsed = Url::parse(&normalized)
            .map_err(|e| GatewayError::Processing(format!("invalid URL '{}': {}", normalized, e)))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(GatewayError::Processing(format!(
                "invalid URL '{}': missing host",
                normalized
            )));
        }

        if !self.allow_prefixes.is_empty()
            && !self
                .allow_prefixes
                .iter()
                .any(|prefix| normalized.starts_with(prefix))
        {
            return Err(blocked());
        }
        if self
            .block_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix))
        {
            return Err(blocked());
        }

        Ok(normalized)
    }

    /// Normalize, validate and convert a decoded URL
    pub async fn convert(&self, candidate: &str) -> Result<String, GatewayError> {
        let url = self.prepare(candidate)?;
        self.invoker.invoke(url).await
    }
}

fn blocked() -> GatewayError {
    GatewayError::Processing("Blocked URL: prefix not allowed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;

    struct EchoEngine;

    impl ConversionEngine for EchoEngine {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn convert(&self, url: &str) -> Result<String, ConversionError> {
            Ok(url.to_string())
        }
    }

    fn echo_gateway() -> GatewayBuilder {
        Gateway::builder().engine(Arc::new(EchoEngine))
    }

    #[test]
    fn test_builder_defaults() {
        let gateway = Gateway::default();
        assert_eq!(gateway.invoker().timeout(), CONVERSION_TIMEOUT);
        assert_eq!(gateway.invoker().engine().name(), "http");
        assert!(gateway.allow_prefixes.is_empty());
        assert!(gateway.block_prefixes.is_empty());
    }

    #[test]
    fn test_builder_options() {
        let gateway = echo_gateway()
            .timeout(Duration::from_secs(3))
            .allow_prefix("https://allowed.com")
            .block_prefix("https://blocked.com")
            .build();
        assert_eq!(gateway.invoker().timeout(), Duration::from_secs(3));
        assert_eq!(gateway.invoker().engine().name(), "echo");
        assert_eq!(*gateway.allow_prefixes, vec!["https://allowed.com"]);
        assert_eq!(*gateway.block_prefixes, vec!["https://blocked.com"]);
    }

    #[test]
    fn test_prepare_normalizes() {
        let gateway = echo_gateway().build();
        assert_eq!(gateway.prepare("http:/example.com").unwrap(), "http://example.com");
        assert_eq!(gateway.prepare("example.com/a?b=c").unwrap(), "https://example.com/a?b=c");
    }

    #[test]
    fn test_prepare_rejects_hostless_url() {
        let gateway = echo_gateway().build();
        let err = gateway.prepare("https:").unwrap_err();
        assert!(matches!(err, GatewayError::Processing(_)));
        assert!(err.to_string().starts_with("URL processing failed: invalid URL 'https://'"));
    }

    #[test]
    fn test_prepare_rejects_unparseable_url() {
        let gateway = echo_gateway().build();
        let err = gateway.prepare("exa mple.com").unwrap_err();
        assert!(matches!(err, GatewayError::Processing(_)));
    }

    #[test]
    fn test_allow_list() {
        let gateway = echo_gateway().allow_prefix("https://docs.rs/").build();
        assert!(gateway.prepare("docs.rs/tokio").is_ok());
        let err = gateway.prepare("https://example.com").unwrap_err();
        assert_eq!(
            err.to_string(),
            "URL processing failed: Blocked URL: prefix not allowed"
        );
    }

    #[test]
    fn test_block_list() {
        let gateway = echo_gateway().block_prefix("http://127.0.0.1").build();
        assert!(gateway.prepare("http://127.0.0.1:8080/admin").is_err());
        assert!(gateway.prepare("https://example.com").is_ok());
    }

    #[tokio::test]
    async fn test_convert_passes_normalized_url_to_engine() {
        let gateway = echo_gateway().build();
        let text = gateway.convert("www.example.com/page").await.unwrap();
        assert_eq!(text, "https://www.example.com/page");
    }
}
