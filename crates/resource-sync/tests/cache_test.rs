use async_trait::async_trait;
use resource_sync::{
    CacheConfig, CacheState, ChangeChannel, ChangeFeed, ChangeSignal, CollectionFetcher,
    MemoryStore, OrderBy, Payload, Projection, ReconnectConfig, RecordId, RemoteStore,
    ResourceCache, ResourceName, ResourceSpec, StoreError, SyncClient, SyncError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn cache(store: &Arc<MemoryStore>, spec: ResourceSpec) -> ResourceCache {
    ResourceCache::new(
        spec,
        CollectionFetcher::new(store.clone()),
        ChangeChannel::new(store.clone()),
    )
}

async fn settle(cache: &ResourceCache, predicate: impl FnMut(&CacheState) -> bool) -> CacheState {
    timeout(WAIT, cache.wait_for(predicate))
        .await
        .expect("Timed out waiting for cache state")
        .expect("Cache state channel closed")
}

fn ids(state: &CacheState) -> Vec<&str> {
    state.collection.iter().map(|r| r.id.as_str()).collect()
}

async fn reads_reach(store: &MemoryStore, count: usize) {
    timeout(WAIT, async {
        while store.read_count() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Timed out waiting for reads");
}

/// A change feed whose subscribe call never answers.
struct SilentFeed;

#[async_trait]
impl ChangeFeed for SilentFeed {
    async fn subscribe(
        &self,
        _resource: &ResourceName,
    ) -> Result<broadcast::Receiver<ChangeSignal>, StoreError> {
        std::future::pending().await
    }
}

fn payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// A burst of change signals during one fetch costs exactly one more fetch.
#[tokio::test]
async fn test_signals_during_fetch_coalesce_into_one_refetch() {
    let store = Arc::new(MemoryStore::new());
    store.seed("contacts", "c0", 1, json!({ "email": "first@example.com" }));
    let gate = store.hold_reads();
    let resource = ResourceName::from("contacts");

    // Open: subscription established, initial fetch parked at the gate
    let mut contacts = cache(&store, ResourceSpec::new("contacts"));
    contacts.open();
    settle(&contacts, |s| s.live).await;

    // Five writes from another session while the fetch is still in flight
    for n in 1..=5 {
        store
            .insert(&resource, payload(json!({ "email": format!("c{n}@example.com") })))
            .await
            .expect("Insert failed");
    }

    // Let the initial fetch land, then the single follow-up
    gate.release(1);
    settle(&contacts, |s| s.revision >= 1).await;
    gate.release(1);
    let state = settle(&contacts, |s| s.revision >= 2 && !s.loading).await;

    assert_eq!(state.collection.len(), 6);
    assert_eq!(store.read_count(), 2);

    // Nothing else is queued
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.read_count(), 2);
    assert_eq!(contacts.state().revision, 2);
}

/// Explicit refreshes coalesce the same way signals do.
#[tokio::test]
async fn test_refresh_calls_coalesce() {
    let store = Arc::new(MemoryStore::new());
    let gate = store.hold_reads();
    let mut services = cache(&store, ResourceSpec::new("services"));
    services.open();

    for _ in 0..10 {
        services.refresh();
    }
    gate.release(1);
    settle(&services, |s| s.revision >= 1).await;
    gate.release(1);
    settle(&services, |s| s.revision >= 2 && !s.loading).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.read_count(), 2);
}

/// A fetch that resolves after close never reaches the state.
#[tokio::test]
async fn test_fetch_landing_after_close_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    store.seed("blog_posts", "p1", 1, json!({ "title": "Hello" }));
    let gate = store.hold_reads();

    let mut posts = cache(&store, ResourceSpec::new("blog_posts"));
    posts.open();
    settle(&posts, |s| s.live).await;

    posts.close();
    gate.release(1);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(store.read_count(), 1);
    assert_eq!(posts.state(), CacheState::default());

    // Reopening starts a fresh lifetime
    drop(gate);
    posts.open();
    let state = settle(&posts, |s| s.revision == 1 && !s.loading).await;
    assert_eq!(ids(&state), vec!["p1"]);
}

/// A fetch from before a reopen never overwrites the newer lifetime's state.
#[tokio::test]
async fn test_fetch_from_previous_lifetime_is_discarded_after_reopen() {
    let store = Arc::new(MemoryStore::new());
    store.seed("contacts", "c1", 1, json!({ "email": "a@example.com" }));
    let gate = store.hold_reads();

    let mut contacts = cache(&store, ResourceSpec::new("contacts"));
    contacts.open();
    reads_reach(&store, 1).await;

    // Reopen while the first fetch is still parked at the gate
    contacts.open();
    reads_reach(&store, 2).await;

    // The older fetch is released first and fails
    store.fail_next_read(StoreError::Transport("connection reset".into()));
    gate.release(1);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = contacts.state();
    assert_eq!(state.error, None);
    assert!(state.loading);
    assert_eq!(state.revision, 0);
    assert!(state.collection.is_empty());

    gate.release(1);
    let state = settle(&contacts, |s| s.revision == 1 && !s.loading).await;
    assert_eq!(state.error, None);
    assert_eq!(ids(&state), vec!["c1"]);
    assert_eq!(store.read_count(), 2);
}

/// A subscribe call that never answers neither blocks the initial fetch nor shutdown.
#[tokio::test]
async fn test_hanging_subscribe_times_out_and_still_loads() {
    let store = Arc::new(MemoryStore::new());
    store.seed("contacts", "c1", 1, json!({}));

    let mut contacts = ResourceCache::new(
        ResourceSpec::new("contacts"),
        CollectionFetcher::new(store.clone()),
        ChangeChannel::new(Arc::new(SilentFeed)).with_timeout(Some(Duration::from_millis(100))),
    )
    .with_reconnect(ReconnectConfig {
        initial_ms: 50,
        max_ms: 200,
        multiplier: 2.0,
        jitter_ms: 0,
    });
    contacts.open();

    let state = settle(&contacts, |s| s.revision == 1 && !s.loading).await;
    assert_eq!(ids(&state), vec!["c1"]);
    assert!(!state.live);
    assert_eq!(store.read_count(), 1);

    // Still retrying in the background; closing ends it
    let handle = contacts.handle();
    timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("Shutdown blocked by a pending subscribe");
    assert!(!contacts.is_open());
}

/// Closing a cache whose first subscribe is still pending stops its actor.
#[tokio::test]
async fn test_close_while_subscribing_stops_actor() {
    let store = Arc::new(MemoryStore::new());
    let mut contacts = ResourceCache::new(
        ResourceSpec::new("contacts"),
        CollectionFetcher::new(store.clone()),
        ChangeChannel::new(Arc::new(SilentFeed)),
    );
    contacts.open();
    tokio::time::sleep(Duration::from_millis(50)).await;
    contacts.refresh();

    let handle = contacts.handle();
    timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("Shutdown blocked by a pending subscribe");
    assert_eq!(store.read_count(), 0);
    assert_eq!(contacts.state(), CacheState::default());
}

/// A failed fetch records the error and keeps the previous collection.
#[tokio::test]
async fn test_fetch_error_keeps_collection() {
    let store = Arc::new(MemoryStore::new());
    store.seed("services", "s1", 1, json!({ "title": "Audit" }));
    store.seed("services", "s2", 2, json!({ "title": "Training" }));

    let mut services = cache(&store, ResourceSpec::new("services"));
    services.open();
    let before = settle(&services, |s| s.revision == 1 && !s.loading).await;

    store.fail_next_read(StoreError::Transport("connection reset".into()));
    services.refresh();
    let failed = settle(&services, |s| s.error.is_some() && !s.loading).await;

    assert_eq!(failed.collection, before.collection);
    assert!(matches!(
        failed.error,
        Some(SyncError::RemoteRead {
            source: StoreError::Transport(_),
            ..
        })
    ));

    // The next successful fetch clears the error
    services.refresh();
    let recovered = settle(&services, |s| s.revision == 2 && !s.loading).await;
    assert_eq!(recovered.error, None);
}

/// Two views of the same resource converge after a create and a delete.
#[tokio::test]
async fn test_two_instances_converge_after_writes() {
    let store = Arc::new(MemoryStore::new());
    store.seed("contacts", "C1", 100, json!({ "email": "one@example.com" }));
    store.seed("contacts", "C2", 200, json!({ "email": "two@example.com" }));
    let client = SyncClient::new(store.clone(), store.clone(), CacheConfig::default());
    let contacts: ResourceName = "contacts".into();

    let list = client.open(ResourceSpec::new("contacts"));
    let dashboard = client.open(ResourceSpec::new("contacts").project(Projection::columns(["email"])));
    settle(&list, |s| s.revision >= 1).await;
    settle(&dashboard, |s| s.revision >= 1).await;

    client
        .gateway()
        .create(&contacts, payload(json!({ "id": "C3", "email": "three@example.com" })))
        .await
        .expect("Create failed");
    let state = settle(&list, |s| s.collection.len() == 3 && !s.loading).await;
    assert_eq!(ids(&state), vec!["C3", "C2", "C1"]);

    client
        .gateway()
        .delete(&contacts, &RecordId::from("C2"))
        .await
        .expect("Delete failed");

    let list_state = settle(&list, |s| s.collection.len() == 2 && !s.loading).await;
    let dashboard_state = settle(&dashboard, |s| s.collection.len() == 2 && !s.loading).await;
    assert_eq!(ids(&list_state), vec!["C3", "C1"]);
    assert_eq!(ids(&dashboard_state), vec!["C3", "C1"]);
}

/// Ties on the order field break by id, and refetches keep the order stable.
#[tokio::test]
async fn test_ordering_is_stable_across_refetches() {
    let store = Arc::new(MemoryStore::new());
    store.seed("testimonials", "t3", 50, json!({ "rating": 5 }));
    store.seed("testimonials", "t1", 50, json!({ "rating": 4 }));
    store.seed("testimonials", "t2", 10, json!({ "rating": 3 }));

    let mut testimonials = cache(&store, ResourceSpec::new("testimonials"));
    testimonials.open();
    let first = settle(&testimonials, |s| s.revision == 1 && !s.loading).await;
    assert_eq!(ids(&first), vec!["t1", "t3", "t2"]);

    testimonials.refresh();
    let second = settle(&testimonials, |s| s.revision == 2 && !s.loading).await;
    assert_eq!(ids(&second), ids(&first));

    let mut ascending = cache(
        &store,
        ResourceSpec::new("testimonials").order_by(OrderBy::asc("rating")),
    );
    ascending.open();
    let state = settle(&ascending, |s| s.revision == 1).await;
    assert_eq!(ids(&state), vec!["t2", "t1", "t3"]);
}

/// Projections are honored, with id and created_at always present.
#[tokio::test]
async fn test_projection_keeps_identity_columns() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "form_submissions",
        "f1",
        1,
        json!({ "form": "contact", "data": { "message": "hi" }, "read": false }),
    );

    let mut submissions = cache(
        &store,
        ResourceSpec::new("form_submissions").project(Projection::columns(["read"])),
    );
    submissions.open();
    let state = settle(&submissions, |s| s.revision == 1).await;
    let record = state.collection.get(&"f1".into()).expect("Missing record");

    assert_eq!(record.column("id"), Some(json!("f1")));
    assert!(record.column("created_at").is_some());
    assert_eq!(record.column("read"), Some(json!(false)));
    assert_eq!(record.column("form"), None);
}

/// A dropped feed is resubscribed and the cache refetches to catch up.
#[tokio::test]
async fn test_lost_subscription_is_recovered() {
    let store = Arc::new(MemoryStore::new());
    let resource = ResourceName::from("services");
    let mut services = cache(&store, ResourceSpec::new("services")).with_reconnect(ReconnectConfig {
        initial_ms: 10,
        max_ms: 50,
        multiplier: 2.0,
        jitter_ms: 0,
    });
    services.open();
    settle(&services, |s| s.live && s.revision == 1).await;

    store.close_feeds();
    settle(&services, |s| !s.live).await;

    // Written while nobody is listening
    store
        .insert(&resource, payload(json!({ "id": "s9", "title": "Missed" })))
        .await
        .expect("Insert failed");

    let state = settle(&services, |s| s.live && s.collection.len() == 1 && !s.loading).await;
    assert_eq!(ids(&state), vec!["s9"]);
}

/// Failing to subscribe at open still loads the collection, and retries later.
#[tokio::test]
async fn test_subscribe_failure_at_open_is_retried() {
    let store = Arc::new(MemoryStore::new());
    store.seed("contacts", "c1", 1, json!({}));
    store.fail_next_subscribe(StoreError::Transport("socket refused".into()));

    let mut contacts = cache(&store, ResourceSpec::new("contacts")).with_reconnect(ReconnectConfig {
        initial_ms: 10,
        max_ms: 50,
        multiplier: 2.0,
        jitter_ms: 0,
    });
    contacts.open();
    let state = settle(&contacts, |s| s.revision >= 1).await;
    assert_eq!(ids(&state), vec!["c1"]);

    settle(&contacts, |s| s.live).await;
    store.notify(&"contacts".into());
    settle(&contacts, |s| s.revision >= 3).await;
}

/// Several signals per write still settle on the final server state.
#[tokio::test]
async fn test_duplicate_signals_converge() {
    let store = Arc::new(MemoryStore::new());
    store.set_signals_per_write(3);
    let resource = ResourceName::from("blog_posts");

    let mut posts = cache(&store, ResourceSpec::new("blog_posts"));
    posts.open();
    settle(&posts, |s| s.live && s.revision == 1).await;

    for n in 0..4 {
        store
            .insert(&resource, payload(json!({ "id": format!("p{n}") })))
            .await
            .expect("Insert failed");
    }
    let state = settle(&posts, |s| s.collection.len() == 4 && !s.loading).await;
    assert_eq!(ids(&state), vec!["p3", "p2", "p1", "p0"]);
}
