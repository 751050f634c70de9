//! HTTP surface: health check and the conversion endpoint

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::path::{decode_target, raw_target};
use crate::USAGE_MESSAGE;
use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Build the router for a gateway
///
/// - `GET /healthz` answers `ok`
/// - `GET /` answers the usage text
/// - `GET /{anything}` converts the URL carried by the path and query
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(convert_url))
        .route("/{*target}", get(convert_url))
        .with_state(gateway)
}

/// Serve a gateway on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, gateway: Gateway, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Listening");
    }
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> Response {
    text_response(StatusCode::OK, "ok".to_string())
}

async fn convert_url(State(gateway): State<Gateway>, OriginalUri(uri): OriginalUri) -> Response {
    let raw = raw_target(&uri);
    info!(path = %raw, "Received URL path");
    if raw.is_empty() {
        return text_response(StatusCode::OK, USAGE_MESSAGE.to_string());
    }

    let decoded = decode_target(&raw);
    match gateway.convert(&decoded).await {
        Ok(content) => text_response(StatusCode::OK, content),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        text_response(self.status(), self.to_string())
    }
}

fn text_response(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
