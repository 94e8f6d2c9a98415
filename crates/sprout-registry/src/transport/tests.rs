//! Transport tests against a mock release server

use super::*;
use sprout_core::error::SproutError;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server_name: &str) -> TransportConfig {
    TransportConfig {
        server_name: server_name.to_string(),
        timeout: Duration::from_secs(5),
        retry: RetryConfig::none(),
        ..TransportConfig::default()
    }
}

#[test]
fn test_transport_config_default() {
    let config = TransportConfig::default();
    assert_eq!(config.server_name, "");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(!config.verify_tls);
    assert!(config.user_agent.starts_with("sprout/"));
}

#[tokio::test]
async fn test_http_fetch_appends_transport_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("action", "get_checksum"))
        .and(query_param("server_name", "www.example.com"))
        .and(query_param("frame_key", "unset"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc123"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(config("www.example.com")).unwrap();
    let url = format!("{}/index.php?action=get_checksum", mock_server.uri());

    assert_eq!(transport.fetch(&url).await, b"abc123".to_vec());
}

#[tokio::test]
async fn test_http_fetch_with_empty_server_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("server_name", ""))
        .and(query_param("frame_key", "unset"))
        .respond_with(ResponseTemplate::new(200).set_body_string("osWFrame Release Server #1"))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(config("")).unwrap();
    let body = transport.fetch(&format!("{}/index.php", mock_server.uri())).await;

    assert_eq!(body, b"osWFrame Release Server #1".to_vec());
}

#[tokio::test]
async fn test_http_non_success_status_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(config("")).unwrap();
    let url = format!("{}/index.php", mock_server.uri());

    assert!(transport.fetch(&url).await.is_empty());
    assert!(matches!(
        transport.try_fetch(&url).await,
        Err(SproutError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_http_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(TransportConfig {
        retry: RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
        ..config("")
    })
    .unwrap();

    assert!(transport.fetch(&format!("{}/index.php", mock_server.uri())).await.is_empty());
}

#[tokio::test]
async fn test_http_timeout_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(TransportConfig {
        timeout: Duration::from_millis(200),
        ..config("")
    })
    .unwrap();

    assert!(transport.fetch(&format!("{}/index.php", mock_server.uri())).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_is_empty() {
    let transport = HttpTransport::new(config("")).unwrap();
    assert!(transport.fetch("http://127.0.0.1:1/index.php").await.is_empty());
}

#[tokio::test]
async fn test_stream_fetch_reads_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("action", "get_content"))
        .and(query_param("server_name", "site"))
        .and(query_param("frame_key", "unset"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]))
        .mount(&mock_server)
        .await;

    let transport = StreamTransport::new(config("site"));
    let url = format!("{}/index.php?action=get_content", mock_server.uri());

    assert_eq!(transport.fetch(&url).await, vec![0x50, 0x4b, 0x03, 0x04]);
}

#[tokio::test]
async fn test_stream_non_success_status_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let transport = StreamTransport::new(config(""));
    assert!(transport.fetch(&format!("{}/", mock_server.uri())).await.is_empty());
}

#[tokio::test]
async fn test_auto_transport_backends() {
    let http = AutoTransport::connect(TransportBackend::Auto, config("")).unwrap();
    assert_eq!(http.kind(), "http");

    let stream = AutoTransport::connect(TransportBackend::Stream, config("")).unwrap();
    assert_eq!(stream.kind(), "stream");
}

#[tokio::test]
async fn test_auto_transport_delegates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    for backend in [TransportBackend::Http, TransportBackend::Stream] {
        let transport = AutoTransport::connect(backend, config("")).unwrap();
        assert_eq!(transport.fetch(&url).await, b"pong".to_vec());
    }
}

#[test]
fn test_backend_names_deserialize() {
    let backend: TransportBackend = serde_json::from_str("\"stream\"").unwrap();
    assert_eq!(backend, TransportBackend::Stream);
    assert_eq!(TransportBackend::default(), TransportBackend::Auto);
}
