use std::net::SocketAddr;

use ktmb_relay::fetch::BasicClient;
use ktmb_relay::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, Position, VehiclePosition};
use ktmb_relay::server::{AppState, TRAINS_ROUTE, router};
use prost::Message;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts the relay on an ephemeral port, pointed at `feed_url`.
async fn spawn_relay(feed_url: &str) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener");
    let addr = listener.local_addr().expect("addr");
    let app = router(AppState::new(BasicClient::new(), feed_url, "KTMB Realtime"));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn upstream(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vehicle-position/ktmb"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn feed_url(server: &MockServer) -> String {
    format!("{}/vehicle-position/ktmb", server.uri())
}

fn two_train_feed() -> Vec<u8> {
    let train = |id: &str, lat: f32| FeedEntity {
        id: id.to_string(),
        vehicle: Some(VehiclePosition {
            position: Some(Position {
                latitude: lat,
                longitude: 101.5,
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            ..Default::default()
        },
        entity: vec![
            train("a", 2.5),
            FeedEntity {
                id: "empty".to_string(),
                ..Default::default()
            },
            train("b", 3.5),
        ],
    }
    .encode_to_vec()
}

#[tokio::test]
async fn test_get_serves_normalized_trains() {
    let server = upstream(ResponseTemplate::new(200).set_body_bytes(two_train_feed())).await;
    let addr = spawn_relay(&feed_url(&server)).await;

    let resp = reqwest::get(format!("http://{addr}{TRAINS_ROUTE}"))
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.expect("json");
    assert_eq!(
        body,
        json!({
            "source": "KTMB Realtime",
            "count": 2,
            "trains": [
                {"id": "Unknown", "tripId": "No Schedule", "lat": 2.5, "lng": 101.5, "speed": 0.0},
                {"id": "Unknown", "tripId": "No Schedule", "lat": 3.5, "lng": 101.5, "speed": 0.0}
            ]
        })
    );
}

#[tokio::test]
async fn test_upstream_503_is_500_with_error() {
    let server = upstream(ResponseTemplate::new(503)).await;
    let addr = spawn_relay(&feed_url(&server)).await;

    let resp = reqwest::get(format!("http://{addr}{TRAINS_ROUTE}"))
        .await
        .expect("request");

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.expect("json");
    let error = body["error"].as_str().expect("error string");
    assert!(!error.is_empty());
    assert!(body.get("trains").is_none());
}

#[tokio::test]
async fn test_malformed_feed_is_500_with_error() {
    let server =
        upstream(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFE, 0x00, 0x01])).await;
    let addr = spawn_relay(&feed_url(&server)).await;

    let resp = reqwest::get(format!("http://{addr}{TRAINS_ROUTE}"))
        .await
        .expect("request");

    assert_eq!(resp.status(), 500);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body, json!({"error": "Failed to fetch train data"}));
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    // Nothing listens on a port we just released.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("listener");
    let dead = listener.local_addr().expect("addr");
    drop(listener);
    let addr = spawn_relay(&format!("http://{dead}/feed")).await;

    let resp = reqwest::get(format!("http://{addr}{TRAINS_ROUTE}"))
        .await
        .expect("request");

    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn test_options_preflight() {
    let server = MockServer::start().await;
    let addr = spawn_relay(&feed_url(&server)).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{addr}{TRAINS_ROUTE}"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    let headers = resp.headers().clone();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
    assert!(headers.contains_key("access-control-allow-headers"));
    assert!(resp.bytes().await.expect("body").is_empty());

    // Preflight never touches the feed provider.
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let server = MockServer::start().await;
    let addr = spawn_relay(&feed_url(&server)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}{TRAINS_ROUTE}"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 405);
    assert_eq!(resp.headers()["allow"], "GET, OPTIONS");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body, json!({"error": "Method not allowed"}));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
