use connection_cell::services::cache::IdentityCache;

#[tokio::test]
async fn maps_both_directions() {
    let cache = IdentityCache::default();

    cache.insert("PAT-1", "conn-a").await;

    assert_eq!(cache.connection_for("PAT-1").await.as_deref(), Some("conn-a"));
    assert_eq!(cache.user_for("conn-a").await.as_deref(), Some("PAT-1"));
}

#[tokio::test]
async fn remove_user_clears_both_directions() {
    let cache = IdentityCache::default();
    cache.insert("PAT-1", "conn-a").await;

    cache.remove_user("PAT-1").await;

    assert_eq!(cache.connection_for("PAT-1").await, None);
    assert_eq!(cache.user_for("conn-a").await, None);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn remove_connection_clears_both_directions() {
    let cache = IdentityCache::default();
    cache.insert("PAT-1", "conn-a").await;

    cache.remove_connection("conn-a").await;

    assert_eq!(cache.connection_for("PAT-1").await, None);
    assert_eq!(cache.user_for("conn-a").await, None);
}

#[tokio::test]
async fn reregistering_a_user_moves_the_connection() {
    let cache = IdentityCache::default();
    cache.insert("PAT-1", "conn-a").await;

    cache.insert("PAT-1", "conn-b").await;

    assert_eq!(cache.connection_for("PAT-1").await.as_deref(), Some("conn-b"));
    assert_eq!(
        cache.user_for("conn-a").await,
        None,
        "The superseded connection must not keep a mapping"
    );
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn a_connection_taken_over_by_another_user_drops_the_old_identity() {
    let cache = IdentityCache::default();
    cache.insert("PAT-1", "conn-a").await;

    cache.insert("PAT-2", "conn-a").await;

    assert_eq!(cache.connection_for("PAT-1").await, None);
    assert_eq!(cache.user_for("conn-a").await.as_deref(), Some("PAT-2"));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn evicts_oldest_identity_at_capacity() {
    let cache = IdentityCache::new(2);

    cache.insert("PAT-1", "conn-a").await;
    cache.insert("PAT-2", "conn-b").await;
    cache.insert("PAT-3", "conn-c").await;

    assert_eq!(cache.len().await, 2, "capacity bound must hold");
    assert_eq!(
        cache.connection_for("PAT-1").await,
        None,
        "the oldest identity is evicted first"
    );
    assert_eq!(cache.connection_for("PAT-2").await.as_deref(), Some("conn-b"));
    assert_eq!(cache.connection_for("PAT-3").await.as_deref(), Some("conn-c"));
}

#[tokio::test]
async fn reinsert_refreshes_eviction_order() {
    let cache = IdentityCache::new(2);

    cache.insert("PAT-1", "conn-a").await;
    cache.insert("PAT-2", "conn-b").await;
    // Touching PAT-1 makes PAT-2 the oldest.
    cache.insert("PAT-1", "conn-a").await;
    cache.insert("PAT-3", "conn-c").await;

    assert_eq!(cache.connection_for("PAT-1").await.as_deref(), Some("conn-a"));
    assert_eq!(cache.connection_for("PAT-2").await, None);
}
