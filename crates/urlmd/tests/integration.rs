//! Integration tests for urlmd using wiremock as the upstream

use std::time::Duration;
use urlmd::{Gateway, GatewayBuilder, USAGE_MESSAGE};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve a gateway on an ephemeral port and return its base URL
async fn spawn_gateway(builder: GatewayBuilder) -> String {
    let gateway: Gateway = builder.build();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        urlmd::server::serve(listener, gateway, std::future::pending())
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

/// GET the gateway with `target` as the path, returning status and body
async fn get(gateway: &str, target: &str) -> (u16, String) {
    let resp = reqwest::get(format!("{}/{}", gateway, target))
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_healthz() {
    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, "healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_usage_on_empty_path() {
    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, "").await;
    assert_eq!(status, 200);
    assert_eq!(body, USAGE_MESSAGE);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_html_to_markdown() {
    let upstream = MockServer::start().await;

    let html = r#"<!DOCTYPE html>
<html>
<head><title>Test</title></head>
<body>
    <h1>Hello World</h1>
    <p>This is a <strong>test</strong> paragraph with a <a href="/more">link</a>.</p>
    <ul>
        <li>Item 1</li>
        <li>Item 2</li>
    </ul>
    <script>alert('bad');</script>
</body>
</html>"#;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, &format!("{}/page", upstream.uri())).await;

    assert_eq!(status, 200);
    assert!(body.contains("# Hello World"));
    assert!(body.contains("**test**"));
    assert!(body.contains("[link](/more)"));
    assert!(body.contains("- Item 1"));
    assert!(body.contains("- Item 2"));
    assert!(!body.contains("alert"));
    assert!(!body.contains("# Test"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_collapsed_scheme_separator() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("plain notes")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&upstream)
        .await;

    // "http://127.0.0.1:port" becomes "http:/127.0.0.1:port"
    let collapsed = upstream.uri().replacen("://", ":/", 1);
    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, &format!("{}/notes", collapsed)).await;

    assert_eq!(status, 200);
    assert_eq!(body, "plain notes");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_string_reaches_upstream() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(wiremock::matchers::query_param("q", "rust"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"hits\": 3}")
                .insert_header("content-type", "application/json"),
        )
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, &format!("{}/search?q=rust", upstream.uri())).await;

    assert_eq!(status, 200);
    assert_eq!(body, "{\"hits\": 3}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_custom_user_agent() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "TestAgent/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("matched")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder().user_agent("TestAgent/1.0")).await;
    let (status, body) = get(&gateway, &format!("{}/ua", upstream.uri())).await;

    assert_eq!(status, 200);
    assert_eq!(body, "matched");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_content_is_unsupported() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4E, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, &format!("{}/image.png", upstream.uri())).await;

    assert_eq!(status, 415);
    assert!(body.starts_with("Unsupported URL format: "));
    assert!(body.contains("image/png"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upstream_error_status_is_conversion_failure() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, &format!("{}/missing", upstream.uri())).await;

    assert_eq!(status, 400);
    assert_eq!(body, "URL conversion failed: Upstream returned HTTP 404 Not Found");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_upstream_is_conversion_failure() {
    let gateway = spawn_gateway(Gateway::builder()).await;
    let (status, body) = get(&gateway, "http://127.0.0.1:9/").await;

    assert_eq!(status, 400);
    assert!(body.starts_with("URL conversion failed: "));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_upstream_times_out() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("eventually")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&upstream)
        .await;

    let gateway =
        spawn_gateway(Gateway::builder().timeout(Duration::from_millis(300))).await;

    let started = std::time::Instant::now();
    let (status, body) = get(&gateway, &format!("{}/slow", upstream.uri())).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(status, 504);
    assert_eq!(body, "Conversion timed out. Please try again later.");

    // The gateway keeps serving while the abandoned call is still running
    let (status, body) = get(&gateway, "healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocked_prefix() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(0)
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(Gateway::builder().block_prefix("http://127.0.0.1")).await;
    let (status, body) = get(&gateway, &format!("{}/", upstream.uri())).await;

    assert_eq!(status, 400);
    assert_eq!(body, "URL processing failed: Blocked URL: prefix not allowed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_allow_prefix_rejects_other_hosts() {
    let gateway =
        spawn_gateway(Gateway::builder().allow_prefix("https://allowed.example.com")).await;
    let (status, body) = get(&gateway, "https://other.example.com/").await;

    assert_eq!(status, 400);
    assert!(body.contains("prefix not allowed"));
}
