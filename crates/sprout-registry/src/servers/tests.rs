use super::*;
use crate::transport::{HttpTransport, MemoryTransport, RetryConfig, TransportConfig};
use sprout_core::types::{ServerDescriptor, ServerListInfo};

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const IDENTITY: &str = "osWFrame Release Server #1";

fn server(id: &str, url: &str) -> ServerDescriptor {
    ServerDescriptor {
        id: id.to_string(),
        name: format!("Mirror {}", id),
        url: url.to_string(),
    }
}

fn list(urls: &[&str]) -> ServerList {
    let servers = urls
        .iter()
        .enumerate()
        .map(|(i, url)| server(&(i + 1).to_string(), url))
        .collect();
    ServerList::new(ServerListInfo::default(), servers)
}

#[tokio::test]
async fn test_first_identifying_server_wins() {
    let transport = MemoryTransport::new()
        .with_response("http://a/", IDENTITY)
        .with_response("http://b/", IDENTITY);

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&["http://a/", "http://b/"]));

    let summary = registry.probe_all(&transport).await;
    assert_eq!(summary.connected, vec!["main"]);
    assert!(summary.all_connected());

    let connected = registry.connected("main").unwrap();
    assert_eq!(connected.base_url(), "http://a/");
    assert_eq!(connected.identity, IDENTITY);
    assert!(connected.connected);

    // The second mirror is never contacted once the first answered
    assert_eq!(transport.count_matching("http://b/"), 0);
}

#[tokio::test]
async fn test_oversized_identity_is_skipped() {
    let long_body = format!("{}{}", IDENTITY, "x".repeat(200 - IDENTITY.len()));
    let short_body = format!("{} (mirror b) ok", IDENTITY);
    assert_eq!(short_body.len(), 40);

    let transport = MemoryTransport::new()
        .with_response("http://a/", long_body)
        .with_response("http://b/", short_body.clone());

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&["http://a/", "http://b/"]));
    registry.probe_all(&transport).await;

    let connected = registry.connected("main").unwrap();
    assert_eq!(connected.server.id, "2");
    assert_eq!(connected.identity, short_body);
}

#[tokio::test]
async fn test_silent_list_stays_unconnected() {
    let transport = MemoryTransport::new().with_response("http://live/", IDENTITY);

    let mut registry = ServerRegistry::new();
    registry.register("dead", list(&["http://down-1/", "http://down-2/"]));
    registry.register("live", list(&["http://live/"]));

    let summary = registry.probe_all(&transport).await;
    assert_eq!(summary.connected, vec!["live"]);
    assert_eq!(summary.unconnected, vec!["dead"]);
    assert!(!summary.all_connected());

    assert!(!registry.is_connected("dead"));
    assert!(registry.is_connected("live"));
    assert_eq!(transport.count_matching("down-"), 2);
}

#[tokio::test]
async fn test_marker_is_case_insensitive() {
    let transport = MemoryTransport::new().with_response("http://a/", "OSWFRAME RELEASE SERVER (eu)");

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&["http://a/"]));
    registry.probe_all(&transport).await;

    assert!(registry.is_connected("main"));
}

#[tokio::test]
async fn test_probe_unknown_list() {
    let transport = MemoryTransport::new();
    let mut registry = ServerRegistry::new();

    let result = registry.probe_list("missing", &transport).await;
    assert!(matches!(result, Err(SproutError::ServerListNotRegistered { .. })));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_reregistering_drops_connection() {
    let transport = MemoryTransport::new().with_response("http://a/", IDENTITY);

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&["http://a/"]));
    registry.probe_all(&transport).await;
    assert!(registry.is_connected("main"));

    registry.register("main", list(&["http://other/"]));
    assert!(!registry.is_connected("main"));
    assert_eq!(registry.list("main").unwrap().len(), 1);
}

#[test]
fn test_register_json_keyed_entries() {
    let json = r#"{
        "info": {"name": "oswframe2k20", "package": "tools.main"},
        "data": {
            "1": {"server_id": "1", "server_name": "Primary", "server_url": "https://one.example/"},
            "2": {"server_id": "2", "server_name": "Backup", "server_url": "https://two.example/"}
        }
    }"#;

    let mut registry = ServerRegistry::new();
    registry.register_json("oswframe2k20", json).unwrap();

    let names: Vec<&str> = registry.list_names().collect();
    assert_eq!(names, vec!["oswframe2k20"]);

    let urls: Vec<&str> = registry
        .list("oswframe2k20")
        .unwrap()
        .servers()
        .map(|s| s.url.as_str())
        .collect();
    assert_eq!(urls, vec!["https://one.example/", "https://two.example/"]);
}

#[test]
fn test_register_json_rejects_garbage() {
    let mut registry = ServerRegistry::new();
    let err = registry.register_json("main", "{\"info\": ").unwrap_err();
    assert!(matches!(err, SproutError::JsonParse { .. }));
    assert!(registry.list("main").is_none());
}

#[tokio::test]
async fn test_probe_over_http_stops_at_first_match() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IDENTITY))
        .expect(1)
        .mount(&first)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IDENTITY))
        .expect(0)
        .mount(&second)
        .await;

    let transport = HttpTransport::new(TransportConfig {
        retry: RetryConfig::none(),
        ..TransportConfig::default()
    })
    .unwrap();

    let first_url = format!("{}/", first.uri());
    let second_url = format!("{}/", second.uri());

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&[first_url.as_str(), second_url.as_str()]));
    let summary = registry.probe_all(&transport).await;

    assert_eq!(summary.connected, vec!["main"]);
    assert_eq!(registry.connected("main").unwrap().base_url(), first_url);
}

#[tokio::test]
async fn test_probe_over_http_skips_failing_mirror() {
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&broken)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IDENTITY))
        .mount(&healthy)
        .await;

    let transport = HttpTransport::new(TransportConfig {
        retry: RetryConfig::none(),
        ..TransportConfig::default()
    })
    .unwrap();

    let broken_url = format!("{}/", broken.uri());
    let healthy_url = format!("{}/", healthy.uri());

    let mut registry = ServerRegistry::new();
    registry.register("main", list(&[broken_url.as_str(), healthy_url.as_str()]));
    registry.probe_all(&transport).await;

    assert_eq!(registry.connected("main").unwrap().base_url(), healthy_url);
}
