//! Tests against a live Redis. They run only when `REDIS_URL` is set, for
//! example `REDIS_URL=redis://127.0.0.1:6379/ cargo test -p ispgate-ratelimit`.

use ispgate_ratelimit::{
    CounterStore, FailureMode, RateDecision, RateLimiter, RedisCounterStore, KEY_PREFIX,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

async fn connect() -> Option<RedisCounterStore> {
    let Ok(url) = std::env::var("REDIS_URL") else {
        eprintln!("REDIS_URL not set, skipping");
        return None;
    };
    Some(
        RedisCounterStore::connect(&url, Duration::from_secs(2))
            .await
            .unwrap(),
    )
}

/// A key no other test run has used.
fn fresh_key(name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{KEY_PREFIX}test-{name}-{}-{nanos}", std::process::id())
}

// ── counter store ─────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_has_no_count_or_ttl() {
    let Some(store) = connect().await else { return };
    let key = fresh_key("missing");
    assert_eq!(store.count(&key).await.unwrap(), None);
    assert_eq!(store.ttl(&key).await.unwrap(), None);
}

#[tokio::test]
async fn first_increment_anchors_window() {
    let Some(store) = connect().await else { return };
    let key = fresh_key("anchor");

    assert_eq!(store.increment(&key, Duration::from_secs(10)).await.unwrap(), 1);
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(store.increment(&key, Duration::from_secs(10)).await.unwrap(), 2);

    assert_eq!(store.count(&key).await.unwrap(), Some(2));
    let ttl = store.ttl(&key).await.unwrap().unwrap();
    assert!(ttl <= Duration::from_secs(9), "window was extended: {ttl:?}");
}

#[tokio::test]
async fn key_without_expiry_reports_no_ttl() {
    let Some(store) = connect().await else { return };
    let key = fresh_key("persistent");
    let url = std::env::var("REDIS_URL").unwrap();
    let client = redis::Client::open(url.as_str()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let _: () = redis::cmd("SET")
        .arg(&key)
        .arg(5)
        .query_async(&mut conn)
        .await
        .unwrap();

    assert_eq!(store.count(&key).await.unwrap(), Some(5));
    assert_eq!(store.ttl(&key).await.unwrap(), None);

    let _: () = redis::cmd("DEL")
        .arg(&key)
        .query_async(&mut conn)
        .await
        .unwrap();
}

// ── limiter over redis ────────────────────────────────────────────

#[tokio::test]
async fn limiter_rejects_fourth_request_then_reopens() {
    let Some(store) = connect().await else { return };
    let limiter = RateLimiter::new(Arc::new(store), FailureMode::Closed);
    let client = fresh_key("client");
    let window = Duration::from_secs(2);

    for _ in 0..3 {
        assert_eq!(limiter.check(&client, 3, window).await, RateDecision::Allowed);
    }
    let rejected = limiter.check(&client, 3, window).await;
    assert!(matches!(
        rejected,
        RateDecision::Rejected { retry_after_secs } if (1..=2).contains(&retry_after_secs)
    ));

    tokio::time::sleep(Duration::from_millis(2_200)).await;
    assert_eq!(limiter.check(&client, 3, window).await, RateDecision::Allowed);
}

// ── connection ────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_server_fails_to_connect() {
    let result = RedisCounterStore::connect("redis://127.0.0.1:1/", Duration::from_millis(300)).await;
    assert!(result.is_err());
}
