//! Tests for `JsonFileStore` against files in a temporary directory.

use std::{collections::BTreeSet, time::Duration};

use dropwatch_core::{
  account::AccountId, item::ItemId, state::StateSnapshot, store::StateStore,
};
use tempfile::{TempDir, tempdir};

use crate::JsonFileStore;

fn scratch() -> TempDir { tempdir().expect("tempdir") }

fn file_names(dir: &TempDir) -> Vec<String> {
  let mut names: Vec<String> = std::fs::read_dir(dir.path())
    .unwrap()
    .filter_map(|e| e.ok())
    .map(|e| e.file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}

fn ids(raw: &[&str]) -> BTreeSet<ItemId> {
  raw.iter().map(|s| ItemId::from(*s)).collect()
}

#[tokio::test]
async fn missing_file_loads_empty_and_is_created() {
  let dir = scratch();
  let path = dir.path().join("state.json");
  let store = JsonFileStore::new(&path);

  let snap = store.load().await.unwrap();
  assert!(snap.is_empty());
  assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
}

#[tokio::test]
async fn missing_parent_directory_is_created() {
  let dir = scratch();
  let path = dir.path().join("nested").join("state.json");
  let store = JsonFileStore::new(&path);

  assert!(store.load().await.unwrap().is_empty());
  assert!(path.exists());
}

#[tokio::test]
async fn corrupt_file_is_reinitialised() {
  let dir = scratch();
  let path = dir.path().join("state.json");
  std::fs::write(&path, "{ not json").unwrap();

  let store = JsonFileStore::new(&path);
  assert!(store.load().await.unwrap().is_empty());

  let on_disk: StateSnapshot =
    serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert!(on_disk.is_empty());
}

#[tokio::test]
async fn save_then_load_returns_same_snapshot() {
  let dir = scratch();
  let store = JsonFileStore::new(dir.path().join("state.json"));

  let mut snap = StateSnapshot::new();
  snap.replace(AccountId::from("alice"), ids(&["1", "2"]));
  snap.replace(AccountId::from("bob"), BTreeSet::new());
  store.save(&snap).await.unwrap();

  let reopened = JsonFileStore::new(dir.path().join("state.json"));
  assert_eq!(reopened.load().await.unwrap(), snap);
}

#[tokio::test]
async fn document_format_is_account_to_id_array() {
  let dir = scratch();
  let path = dir.path().join("state.json");
  let store = JsonFileStore::new(&path);

  let mut snap = StateSnapshot::new();
  snap.replace(AccountId::from("alice"), ids(&["9"]));
  store.save(&snap).await.unwrap();

  let value: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert_eq!(value, serde_json::json!({ "alice": ["9"] }));
}

#[tokio::test]
async fn save_leaves_no_temporary_file_behind() {
  let dir = scratch();
  let store = JsonFileStore::new(dir.path().join("state.json"));
  store.save(&StateSnapshot::new()).await.unwrap();
  store.save(&StateSnapshot::new()).await.unwrap();

  assert_eq!(file_names(&dir), vec!["state.json"]);
}

#[tokio::test]
async fn abandoned_save_does_not_clobber_the_next_one() {
  let dir = scratch();
  let store = JsonFileStore::new(dir.path().join("state.json"));

  let mut stale = StateSnapshot::new();
  stale.replace(AccountId::from("alice"), ids(&["1"]));
  let mut fresh = StateSnapshot::new();
  fresh.replace(AccountId::from("alice"), ids(&["1", "2"]));

  // Give up on the first save while its write is still in flight.
  let _ = tokio::time::timeout(Duration::ZERO, store.save(&stale)).await;
  store.save(&fresh).await.unwrap();

  assert_eq!(store.load().await.unwrap(), fresh);
  assert_eq!(file_names(&dir), vec!["state.json"]);
}

#[tokio::test]
async fn existing_document_is_preserved_on_load() {
  let dir = scratch();
  let path = dir.path().join("state.json");
  std::fs::write(&path, r#"{"alice":["1","2"]}"#).unwrap();

  let store = JsonFileStore::new(&path);
  let snap = store.load().await.unwrap();
  assert_eq!(snap.seen(&AccountId::from("alice")), Some(&ids(&["1", "2"])));
}
