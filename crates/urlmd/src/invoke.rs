//! Bounded-time conversion invoker

use crate::engine::ConversionEngine;
use crate::error::GatewayError;
use crate::CONVERSION_TIMEOUT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Runs a blocking [`ConversionEngine`] on tokio's blocking pool under a deadline
///
/// When the deadline fires the handler stops waiting. The blocking task is
/// left to finish on its own and its result is dropped with the join handle.
#[derive(Clone)]
pub struct Invoker {
    engine: Arc<dyn ConversionEngine>,
    timeout: Duration,
}

impl Invoker {
    /// Create an invoker with the default 25 second deadline
    pub fn new(engine: Arc<dyn ConversionEngine>) -> Self {
        Self {
            engine,
            timeout: CONVERSION_TIMEOUT,
        }
    }

    /// Set the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The wrapped engine
    pub fn engine(&self) -> &Arc<dyn ConversionEngine> {
        &self.engine
    }

    /// Convert `url`, classifying every failure
    pub async fn invoke(&self, url: String) -> Result<String, GatewayError> {
        let engine = Arc::clone(&self.engine);
        let task_url = url.clone();
        let task = tokio::task::spawn_blocking(move || engine.convert(&task_url));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(text))) => Ok(text),
            Ok(Ok(Err(e))) => {
                warn!(url = %url, engine = self.engine.name(), error = %e, "Conversion failed");
                Err(e.into())
            }
            Ok(Err(join_err)) => {
                error!(url = %url, engine = self.engine.name(), "Conversion task failed: {}", join_err);
                Err(GatewayError::Internal(panic_message(join_err)))
            }
            Err(_) => {
                warn!(url = %url, timeout_secs = self.timeout.as_secs_f64(), "Conversion timed out");
                Err(GatewayError::Timeout)
            }
        }
    }
}

/// Best-effort description of a failed blocking task
fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "conversion task panicked".to_string()
    }
}
