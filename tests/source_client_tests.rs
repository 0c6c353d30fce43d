//! Integration tests for SourceClient against a local HTTP server
//!
//! These tests verify:
//! - Request headers sent with every fetch
//! - Content-Encoding dispatch for compressed bodies
//! - Each failure mode maps to its FetchError variant

use flate2::Compression;
use flate2::write::GzEncoder;
use item_mapper::models::SourceSettings;
use item_mapper::services::{FetchError, SourceClient};
use serde_json::{Value, json};
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &str = r#"[{"def_index":"4619","market_hash_name":"Agent"}]"#;

fn client() -> SourceClient {
    SourceClient::new(&SourceSettings::default()).unwrap()
}

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_sends_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents.json"))
        .and(header("priority", "u=1"))
        .and(header_exists("accept-encoding"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    let value: Value = client()
        .fetch(&format!("{}/agents.json", server.uri()))
        .await
        .unwrap();

    assert_eq!(value[0]["def_index"], json!("4619"));
}

#[tokio::test]
async fn test_fetch_decodes_gzip_body() {
    let server = MockServer::start().await;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(PAYLOAD.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    serve(
        &server,
        "/agents.json",
        ResponseTemplate::new(200)
            .insert_header("content-encoding", "gzip")
            .set_body_bytes(compressed),
    )
    .await;

    let value: Value = client()
        .fetch(&format!("{}/agents.json", server.uri()))
        .await
        .unwrap();

    assert_eq!(value, serde_json::from_str::<Value>(PAYLOAD).unwrap());
}

#[tokio::test]
async fn test_fetch_decodes_zstd_body() {
    let server = MockServer::start().await;
    let compressed = zstd::stream::encode_all(PAYLOAD.as_bytes(), 0).unwrap();

    serve(
        &server,
        "/agents.json",
        ResponseTemplate::new(200)
            .insert_header("content-encoding", "zstd")
            .set_body_bytes(compressed),
    )
    .await;

    let value: Value = client()
        .fetch(&format!("{}/agents.json", server.uri()))
        .await
        .unwrap();

    assert_eq!(value[0]["market_hash_name"], json!("Agent"));
}

#[tokio::test]
async fn test_non_ok_status_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/gone.json", ResponseTemplate::new(503)).await;

    let url = format!("{}/gone.json", server.uri());
    let err = client().fetch::<Value>(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 503, .. }));
    assert_eq!(err.url(), url);
}

#[tokio::test]
async fn test_no_content_status_is_rejected() {
    let server = MockServer::start().await;
    serve(&server, "/empty.json", ResponseTemplate::new(204)).await;

    let err = client()
        .fetch::<Value>(&format!("{}/empty.json", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 204, .. }));
}

#[tokio::test]
async fn test_corrupt_compressed_body_is_reported() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/agents.json",
        ResponseTemplate::new(200)
            .insert_header("content-encoding", "gzip")
            .set_body_bytes(b"not gzip at all".to_vec()),
    )
    .await;

    let err = client()
        .fetch::<Value>(&format!("{}/agents.json", server.uri()))
        .await
        .unwrap_err();

    match err {
        FetchError::Decompress { encoding, .. } => assert_eq!(encoding, "gzip"),
        other => panic!("expected decompress error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/agents.json",
        ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
    )
    .await;

    let err = client()
        .fetch::<Value>(&format!("{}/agents.json", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow.json",
        ResponseTemplate::new(200)
            .set_body_string(PAYLOAD)
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let settings = SourceSettings {
        request_timeout_secs: 1,
        ..SourceSettings::default()
    };
    let client = SourceClient::new(&settings).unwrap();

    let err = client
        .fetch::<Value>(&format!("{}/slow.json", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}
