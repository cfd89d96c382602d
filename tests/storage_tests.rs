//! Link store tests
//!
//! Exercises the store-level contracts: atomic insert-or-conflict,
//! expired-code reclamation, expiry-aware resolution, and ledger cascade
//! on delete.

use std::sync::Arc;
use std::sync::Once;

use chrono::{Duration, Utc};
use linkforge::analytics::{ClickContext, ClickEvent, ClickSink};
use linkforge::config::init_config;
use linkforge::errors::LinkforgeError;
use linkforge::storage::SeaOrmStore;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_test_store(name: &str) -> (Arc<SeaOrmStore>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join(name);
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStore::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    (storage, temp_dir)
}

#[tokio::test]
async fn test_insert_and_resolve() {
    let (storage, _dir) = create_test_store("insert.db").await;

    let link = storage
        .insert("aZ3kLmQ9pT", "https://example.com/page", None)
        .await
        .expect("insert should succeed");

    assert_eq!(link.short_code, "aZ3kLmQ9pT");
    assert_eq!(link.original_url, "https://example.com/page");
    assert!(link.expires_at.is_none());

    let resolved = storage.resolve("aZ3kLmQ9pT").await.expect("resolve");
    assert_eq!(resolved.id, link.id);
    assert_eq!(resolved.original_url, "https://example.com/page");
}

#[tokio::test]
async fn test_insert_conflict_on_live_code() {
    let (storage, _dir) = create_test_store("conflict.db").await;

    storage
        .insert("sameCode01", "https://example.com/a", None)
        .await
        .expect("first insert");

    let err = storage
        .insert("sameCode01", "https://example.com/b", None)
        .await
        .expect_err("second insert must conflict");

    assert!(err.is_duplicate_code(), "got {:?}", err);

    // The loser must not have overwritten the winner
    let survivor = storage.get_by_code("sameCode01").await.unwrap();
    assert_eq!(survivor.original_url, "https://example.com/a");
}

#[tokio::test]
async fn test_expired_code_is_reclaimed() {
    let (storage, _dir) = create_test_store("reclaim.db").await;

    let dead = storage
        .insert(
            "deadCode01",
            "https://example.com/old",
            Some(Utc::now() - Duration::hours(1)),
        )
        .await
        .expect("insert expired link");

    // The code is free again because its holder is dead
    let reborn = storage
        .insert("deadCode01", "https://example.com/new", None)
        .await
        .expect("reclaim should succeed");

    assert_ne!(reborn.id, dead.id);

    let current = storage.get_by_code("deadCode01").await.unwrap();
    assert_eq!(current.id, reborn.id);
    assert_eq!(current.original_url, "https://example.com/new");
}

#[tokio::test]
async fn test_reclaim_does_not_inherit_clicks() {
    let (storage, _dir) = create_test_store("reclaim_clicks.db").await;

    let dead = storage
        .insert(
            "deadCode02",
            "https://example.com/old",
            Some(Utc::now() - Duration::hours(1)),
        )
        .await
        .unwrap();

    // Ledger entries for the expired holder
    storage
        .flush_events(vec![
            ClickEvent::new(dead.id.clone(), ClickContext::empty()),
            ClickEvent::new(dead.id.clone(), ClickContext::empty()),
        ])
        .await
        .expect("flush");
    assert_eq!(storage.count_clicks(&dead.id).await.unwrap(), 2);

    let reborn = storage
        .insert("deadCode02", "https://example.com/new", None)
        .await
        .unwrap();

    // The old holder's events died with it (cascade); the new link
    // starts from zero
    assert_eq!(storage.count_clicks(&dead.id).await.unwrap(), 0);
    assert_eq!(storage.count_clicks(&reborn.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_resolve_not_found() {
    let (storage, _dir) = create_test_store("notfound.db").await;

    let err = storage.resolve("noSuchCode").await.unwrap_err();
    assert!(matches!(err, LinkforgeError::NotFound(_)));
}

#[tokio::test]
async fn test_resolve_expired() {
    let (storage, _dir) = create_test_store("expired.db").await;

    storage
        .insert(
            "expiredXyz",
            "https://example.com",
            Some(Utc::now() - Duration::minutes(5)),
        )
        .await
        .unwrap();

    let err = storage.resolve("expiredXyz").await.unwrap_err();
    assert!(matches!(err, LinkforgeError::Expired(_)));

    // Expired is distinguishable from never-existed, and the row is
    // still there for the stats path
    let link = storage.get_by_code("expiredXyz").await.unwrap();
    assert!(!link.is_live());
}

#[tokio::test]
async fn test_resolve_future_expiry_is_live() {
    let (storage, _dir) = create_test_store("future.db").await;

    storage
        .insert(
            "futureAbc1",
            "https://example.com",
            Some(Utc::now() + Duration::hours(1)),
        )
        .await
        .unwrap();

    assert!(storage.resolve("futureAbc1").await.is_ok());
}

#[tokio::test]
async fn test_remove_cascades_ledger() {
    let (storage, _dir) = create_test_store("cascade.db").await;

    let link = storage
        .insert("cascadeK9z", "https://example.com", None)
        .await
        .unwrap();

    storage
        .flush_events(vec![ClickEvent::new(link.id.clone(), ClickContext::empty())])
        .await
        .unwrap();
    assert_eq!(storage.count_clicks(&link.id).await.unwrap(), 1);

    storage.remove("cascadeK9z").await.unwrap();

    assert!(matches!(
        storage.get_by_code("cascadeK9z").await,
        Err(LinkforgeError::NotFound(_))
    ));
    assert_eq!(storage.count_clicks(&link.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_remove_missing_is_not_found() {
    let (storage, _dir) = create_test_store("remove_missing.db").await;

    assert!(matches!(
        storage.remove("neverThere").await,
        Err(LinkforgeError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_flush_drops_events_for_unknown_links() {
    let (storage, _dir) = create_test_store("orphans.db").await;

    let link = storage
        .insert("knownCode1", "https://example.com", None)
        .await
        .unwrap();

    // One event for a real link, one for a link that no longer exists;
    // the flush keeps the former and silently drops the latter
    storage
        .flush_events(vec![
            ClickEvent::new(link.id.clone(), ClickContext::empty()),
            ClickEvent::new("gone-id-0000", ClickContext::empty()),
        ])
        .await
        .expect("flush must not fail on orphans");

    assert_eq!(storage.count_clicks(&link.id).await.unwrap(), 1);
    assert_eq!(storage.count_clicks("gone-id-0000").await.unwrap(), 0);
}

#[tokio::test]
async fn test_count_clicks_since() {
    let (storage, _dir) = create_test_store("since.db").await;

    let link = storage
        .insert("windowAb12", "https://example.com", None)
        .await
        .unwrap();

    storage
        .flush_events(vec![
            ClickEvent::new(link.id.clone(), ClickContext::empty()),
            ClickEvent::new(link.id.clone(), ClickContext::empty()),
            ClickEvent::new(link.id.clone(), ClickContext::empty()),
        ])
        .await
        .unwrap();

    let long_ago = Utc::now() - Duration::days(1);
    assert_eq!(
        storage.count_clicks_since(&link.id, long_ago).await.unwrap(),
        3
    );

    let future = Utc::now() + Duration::seconds(5);
    assert_eq!(
        storage.count_clicks_since(&link.id, future).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_click_context_round_trips() {
    let (storage, _dir) = create_test_store("context.db").await;

    let link = storage
        .insert("contextXy9", "https://example.com", None)
        .await
        .unwrap();

    let context = ClickContext {
        addr: Some("203.0.113.7".to_string()),
        agent: Some("Mozilla/5.0".to_string()),
        referer: Some("https://news.example.org/".to_string()),
    };

    storage
        .flush_events(vec![ClickEvent::new(link.id.clone(), context)])
        .await
        .unwrap();

    // Context is best-effort metadata; the count is the contract
    assert_eq!(storage.count_clicks(&link.id).await.unwrap(), 1);
}
