mod support;

use assert_matches::assert_matches;
use chrono::Utc;

use connection_cell::error::ConnectionError;
use connection_cell::models::{ConnectionRecord, ConnectionStatus};

use support::build_cell;

#[tokio::test]
async fn connect_creates_a_connected_directory_record() {
    let cell = build_cell();

    cell.lifecycle
        .on_connect("conn-1")
        .await
        .expect("connect should persist a record");

    let record = cell.directory.record("conn-1").unwrap();
    assert_eq!(record.status, ConnectionStatus::Connected);
    assert!(record.connected_at.is_some(), "connect must stamp connectedAt");
    assert_eq!(record.user_id, None, "identity is attached later, on register");
}

#[tokio::test]
async fn connect_fails_when_the_store_is_unavailable() {
    let cell = build_cell();
    cell.directory.set_failing(true);

    let result = cell.lifecycle.on_connect("conn-1").await;

    assert_matches!(
        result,
        Err(ConnectionError::StoreUnavailable(_)),
        "connect establishment is the one place persistence failure is fatal"
    );
}

#[tokio::test]
async fn disconnect_marks_the_record_and_invalidates_the_cache() {
    let cell = build_cell();

    cell.directory.seed_record(ConnectionRecord {
        connection_id: "conn-1".to_string(),
        user_id: Some("PAT-7".to_string()),
        status: ConnectionStatus::Connected,
        connected_at: Some(Utc::now()),
        disconnected_at: None,
    });
    cell.cache.insert("PAT-7", "conn-1").await;

    cell.lifecycle
        .on_disconnect("conn-1")
        .await
        .expect("disconnect should succeed");

    let record = cell.directory.record("conn-1").unwrap();
    assert_eq!(record.status, ConnectionStatus::Disconnected);
    assert!(record.disconnected_at.is_some());

    assert_eq!(
        cell.cache.connection_for("PAT-7").await,
        None,
        "Cache entries must not outlive the transport session"
    );
    assert_eq!(cell.cache.user_for("conn-1").await, None);
}

#[tokio::test]
async fn disconnect_for_an_unknown_connection_still_succeeds() {
    let cell = build_cell();

    cell.lifecycle
        .on_disconnect("conn-ghost")
        .await
        .expect("unknown connections disconnect cleanly");
}

#[tokio::test]
async fn disconnect_clears_cache_even_without_a_directory_record() {
    let cell = build_cell();
    cell.cache.insert("PAT-7", "conn-1").await;

    cell.lifecycle.on_disconnect("conn-1").await.unwrap();

    assert_eq!(cell.cache.user_for("conn-1").await, None);
}
