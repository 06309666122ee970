mod common;

use chrono::Duration;
use common::{envelope, spawn_with, test_settings};
use ispgate_ratelimit::FailureMode;
use ispgate_server::Settings;

fn limited(limit: u64) -> Settings {
    Settings {
        rate_limit: limit,
        ..test_settings()
    }
}

#[tokio::test]
async fn fourth_request_gets_429_with_retry_after() {
    let server = spawn_with(limited(3), FailureMode::Open).await;
    for _ in 0..3 {
        let resp = reqwest::get(server.url("/api/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = reqwest::get(server.url("/api/health")).await.unwrap();
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.headers().get("retry-after").unwrap(), "60");
    let (_, body) = envelope(resp).await;
    assert!(!body.success);
    assert_eq!(
        body.error.as_deref(),
        Some("Rate limit exceeded. Please try again later.")
    );
}

#[tokio::test]
async fn quota_returns_after_window() {
    let server = spawn_with(limited(1), FailureMode::Open).await;
    assert_eq!(reqwest::get(server.url("/api/health")).await.unwrap().status(), 200);
    assert_eq!(reqwest::get(server.url("/api/health")).await.unwrap().status(), 429);

    server.clock.advance(Duration::seconds(61));
    assert_eq!(reqwest::get(server.url("/api/health")).await.unwrap().status(), 200);
}

#[tokio::test]
async fn unknown_routes_and_agents_count_too() {
    let server = spawn_with(limited(2), FailureMode::Open).await;
    assert_eq!(reqwest::get(server.url("/nope")).await.unwrap().status(), 404);
    let resp = server
        .client
        .post(server.url("/api/licenses/validate"))
        .json(&serde_json::json!({"license_key": "K", "hw_id": "H"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(reqwest::get(server.url("/nope")).await.unwrap().status(), 429);
}

#[tokio::test]
async fn forwarded_clients_are_counted_separately() {
    let server = spawn_with(limited(1), FailureMode::Open).await;
    let get = |client_ip: &'static str| {
        server
            .client
            .get(server.url("/api/health"))
            .header("X-Forwarded-For", client_ip)
            .send()
    };
    assert_eq!(get("203.0.113.1").await.unwrap().status(), 200);
    assert_eq!(get("203.0.113.2, 10.0.0.1").await.unwrap().status(), 200);
    assert_eq!(get("203.0.113.1").await.unwrap().status(), 429);
}

#[tokio::test]
async fn untrusted_peer_cannot_pick_its_identity() {
    let settings = Settings {
        trusted_proxies: ispgate_ratelimit::TrustedProxies::new(vec!["10.9.9.9".parse().unwrap()]),
        ..limited(1)
    };
    let server = spawn_with(settings, FailureMode::Open).await;
    let get = |client_ip: &'static str| {
        server
            .client
            .get(server.url("/api/health"))
            .header("X-Forwarded-For", client_ip)
            .send()
    };
    assert_eq!(get("203.0.113.1").await.unwrap().status(), 200);
    assert_eq!(get("203.0.113.2").await.unwrap().status(), 429);
}

#[tokio::test]
async fn cache_outage_fails_open_by_default() {
    let server = spawn_with(limited(1), FailureMode::Open).await;
    server.counters.set_offline(true);
    for _ in 0..5 {
        assert_eq!(reqwest::get(server.url("/api/health")).await.unwrap().status(), 200);
    }
}

#[tokio::test]
async fn cache_outage_fails_closed_when_configured() {
    let server = spawn_with(limited(100), FailureMode::Closed).await;
    server.counters.set_offline(true);
    let resp = reqwest::get(server.url("/api/health")).await.unwrap();
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.headers().get("retry-after").unwrap(), "60");
}
