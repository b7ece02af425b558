//! Queue behavior against a live Redis.
//!
//! Requires a reachable Redis (LISTQ_HOST / LISTQ_PORT, default localhost:6379).

use listq::config::StoreConfig;
use listq::error::Error;
use listq::queue::QueueClient;
use listq::store::{ListStore, RedisStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn test_queue() -> (Arc<RedisStore>, QueueClient<RedisStore>) {
    dotenvy::dotenv().ok();
    let config = StoreConfig {
        host: std::env::var("LISTQ_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("LISTQ_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(6379),
        ..Default::default()
    };
    let store = Arc::new(
        RedisStore::connect(&config, Duration::from_secs(2))
            .await
            .expect("redis connect"),
    );
    let key = format!("listq-test:{}", uuid::Uuid::new_v4());
    (Arc::clone(&store), QueueClient::new(store, key))
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn health_check_pings() {
    let (store, _) = test_queue().await;
    store.health_check().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn quote_scenario_over_redis() {
    let (_, queue) = test_queue().await;

    queue.enqueue(&json!({"quote": "A"})).await.unwrap();
    queue.enqueue(&json!({"quote": "B"})).await.unwrap();
    assert_eq!(queue.dequeue().await.unwrap(), Some(json!({"quote": "A"})));
    assert_eq!(queue.size().await.unwrap(), 1);
    assert_eq!(queue.dequeue().await.unwrap(), Some(json!({"quote": "B"})));
    assert_eq!(queue.dequeue().await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn malformed_entry_over_redis() {
    let (store, queue) = test_queue().await;

    queue.enqueue(&json!({"n": 1})).await.unwrap();
    store
        .push_back(queue.key(), "garbage".to_string())
        .await
        .unwrap();
    queue.enqueue(&json!({"n": 2})).await.unwrap();

    assert_eq!(queue.dequeue().await.unwrap(), Some(json!({"n": 1})));
    assert!(matches!(
        queue.dequeue().await,
        Err(Error::Deserialization { .. })
    ));
    assert_eq!(queue.size().await.unwrap(), 1);
    assert_eq!(queue.dequeue().await.unwrap(), Some(json!({"n": 2})));
}

#[tokio::test]
#[ignore] // Requires nothing listening on port 1
async fn unreachable_store_is_transient() {
    let config = StoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..Default::default()
    };
    let err = match RedisStore::connect(&config, Duration::from_millis(500)).await {
        Ok(_) => panic!("connected to port 1"),
        Err(e) => e,
    };
    assert!(err.is_transient(), "got {err:?}");
}
