//! Persistence tests for the file-backed store.

use std::sync::Arc;

use prodline_core::{
    ClockStore, ConfigStore, ErrorKind, ItemStore, LineConfiguration, LineItem, LineService,
    LineSettings, State, Transition,
};
use prodline_store::FileStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_items_survive_reopen() {
    let temp = TempDir::new().unwrap();

    {
        let store = FileStore::open(temp.path()).unwrap();
        store.write_configuration("default", &LineConfiguration::test_line()).await.unwrap();

        let service = LineService::load(Arc::new(store), &LineSettings::default())
            .await
            .unwrap();
        service.start_production(&Transition::new("X")).await.unwrap();
        service
            .station_depart("X", &Transition::new("X").at_station("1001").with_state(State::Passed))
            .await
            .unwrap();
    }

    let store = FileStore::open(temp.path()).unwrap();
    let service = LineService::load(Arc::new(store), &LineSettings::default())
        .await
        .unwrap();

    let item = service.get_item("X").await.unwrap();
    assert_eq!(item.current_station_id, "1002");
    assert_eq!(item.state, State::Passed);
    assert_eq!(item.version, 1);
    assert_eq!(service.clock_entries("X").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_configuration_round_trips_through_yaml() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap();
    let config = LineConfiguration::test_line();

    store.write_configuration("line-a", &config).await.unwrap();
    assert!(temp.path().join("configs").join("line-a.yaml").exists());

    let loaded = store.load_configuration("line-a").await.unwrap().unwrap();
    assert_eq!(loaded, config);
    assert!(store.load_configuration("line-b").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap();
    store.insert(&LineItem::created("X", "1001")).await.unwrap();

    let mut first = LineItem::created("X", "1001");
    first.state = State::Passed;
    first.version = 1;
    store.set(&first, 0).await.unwrap();

    let mut second = LineItem::created("X", "1001");
    second.state = State::Failed;
    second.version = 1;
    let err = store.set(&second, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let stored = store.get("X").await.unwrap().unwrap();
    assert_eq!(stored.state, State::Passed);
}

#[tokio::test]
async fn test_delete_rewrites_clock_log() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap();
    store.write_configuration("default", &LineConfiguration::test_line()).await.unwrap();

    let service = LineService::load(Arc::new(store.clone()), &LineSettings::default())
        .await
        .unwrap();
    service.start_production(&Transition::new("X")).await.unwrap();
    service.start_production(&Transition::new("Y")).await.unwrap();

    service.delete_item("X").await.unwrap();

    assert!(store.get("X").await.unwrap().is_none());
    assert!(store.entries_for("X").await.unwrap().is_empty());
    assert_eq!(store.entries_for("Y").await.unwrap().len(), 1);
    assert!(!store.delete("X").await.unwrap());
}

#[tokio::test]
async fn test_odd_ids_stay_inside_store() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path().join("data")).unwrap();

    store.insert(&LineItem::created("../escape", "1001")).await.unwrap();
    assert!(!temp.path().join("escape.json").exists());

    let items = store.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "../escape");
    assert!(store.get("../escape").await.unwrap().is_some());
}

/// Readers running alongside a writer always see a whole item.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reads_never_see_partial_writes() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap();
    store.insert(&LineItem::created("X", "1001")).await.unwrap();

    let writer_store = store.clone();
    let writer = tokio::spawn(async move {
        for version in 0..300u64 {
            let mut next = LineItem::created("X", "1001");
            next.state = if version % 2 == 0 { State::Passed } else { State::Failed };
            next.version = version + 1;
            writer_store.set(&next, version).await.unwrap();
        }
    });

    let mut reads = 0;
    while !writer.is_finished() {
        let item = store.get("X").await.unwrap().expect("item should always be readable");
        assert_eq!(item.id, "X");
        assert_eq!(store.list().await.unwrap().len(), 1);
        reads += 1;
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    assert!(reads > 0);
    assert_eq!(store.get("X").await.unwrap().unwrap().version, 300);
}

#[tokio::test]
async fn test_clock_rewrite_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap();
    store.write_configuration("default", &LineConfiguration::test_line()).await.unwrap();
    let service = LineService::load(Arc::new(store.clone()), &LineSettings::default())
        .await
        .unwrap();

    service.start_production(&Transition::new("X")).await.unwrap();
    service.start_production(&Transition::new("Y")).await.unwrap();
    service.delete_item("X").await.unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .chain(std::fs::read_dir(temp.path().join("items")).unwrap())
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "tmp").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
    assert_eq!(store.entries_for("Y").await.unwrap().len(), 1);
}
