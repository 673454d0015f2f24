//! End-to-end hot reload: file edits reach routing decisions.

mod common;

use ccproxy::config::{ConfigSource, ConfigStore, ConfigWatcher};
use ccproxy::routing::{RequestDescriptor, RoutingLabel, Router};
use ccproxy::status::StatusPublisher;
use common::write_config;
use std::sync::Arc;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(100);

fn config(threshold: u64) -> String {
    format!(
        "context_threshold = {}\n\n[[rules]]\nlabel = \"large_context\"\ntarget_model = \"model-B\"\n",
        threshold
    )
}

/// Poll until the store leaves `version`, up to five seconds.
async fn wait_for_version_after(store: &ConfigStore, version: u64) -> bool {
    for _ in 0..100 {
        if store.current().version() > version {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_threshold_edit_changes_routing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), &config(50_000));
    let store = Arc::new(ConfigStore::initialize(&ConfigSource::File(path.clone())).unwrap());
    let router = Router::new(Arc::clone(&store), Arc::new(StatusPublisher::new()));
    let watcher = ConfigWatcher::start(Arc::clone(&store), path.clone(), DEBOUNCE).unwrap();

    let descriptor = RequestDescriptor::new("model-A").with_context_size(55_000);
    let before = router.route(&descriptor);
    assert_eq!(before.label(), Some(RoutingLabel::LargeContext));

    let version = store.current().version();
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, config(60_000)).unwrap();
    assert!(wait_for_version_after(&store, version).await);

    let after = router.route(&descriptor);
    assert!(after.is_passthrough);
    assert_eq!(after.routed_model, "model-A");

    watcher.stop().await;
}

#[tokio::test]
async fn test_invalid_edit_keeps_active_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), &config(50_000));
    let store = Arc::new(ConfigStore::initialize(&ConfigSource::File(path.clone())).unwrap());
    let watcher = ConfigWatcher::start(Arc::clone(&store), path.clone(), DEBOUNCE).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, "context_threshold = \"lots\"\n").unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    let snapshot = store.current();
    assert_eq!(snapshot.version(), 1);
    assert_eq!(snapshot.context_threshold(), 50_000);
    assert_eq!(snapshot.rules().len(), 1);

    // A later valid edit still goes through.
    std::fs::write(&path, config(40_000)).unwrap();
    assert!(wait_for_version_after(&store, 1).await);
    assert_eq!(store.current().context_threshold(), 40_000);

    watcher.stop().await;
    assert!(!watcher.is_running());
}

#[tokio::test]
async fn test_subscribers_see_each_committed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), &config(50_000));
    let store = Arc::new(ConfigStore::initialize(&ConfigSource::File(path.clone())).unwrap());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    store.subscribe(move |snapshot| {
        let _ = tx.send(snapshot.context_threshold());
    });

    let watcher = ConfigWatcher::start(Arc::clone(&store), path.clone(), DEBOUNCE).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, config(65_000)).unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen, 65_000);

    watcher.stop().await;
}
