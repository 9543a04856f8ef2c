use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteStore;

#[tokio::test]
async fn sqlite_roundtrip_overwrites_and_removes() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get("quiz_user").await.unwrap(), None);

    store
        .set("quiz_user", r#"{"name":"Ana","attendanceNumber":"12","classLabel":"X"}"#)
        .await
        .unwrap();
    store.set("totalScore", "0").await.unwrap();
    store.set("totalScore", "5").await.unwrap();

    assert_eq!(store.get("totalScore").await.unwrap().as_deref(), Some("5"));
    assert!(store.get("quiz_user").await.unwrap().unwrap().contains("Ana"));

    store.remove("totalScore").await.unwrap();
    store.remove("totalScore").await.unwrap();
    assert_eq!(store.get("totalScore").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("first migrate");
    store.set("quiz_max_index", "4").await.unwrap();
    store.migrate().await.expect("second migrate");

    assert_eq!(
        store.get("quiz_max_index").await.unwrap().as_deref(),
        Some("4")
    );
}

#[tokio::test]
async fn storage_sqlite_exposes_trait_object() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_storage?mode=memory&cache=shared")
        .await
        .expect("open storage");
    storage.store.set("quiz_endTime", "1700000120000").await.unwrap();
    assert_eq!(
        storage.store.get("quiz_endTime").await.unwrap().as_deref(),
        Some("1700000120000")
    );
}
