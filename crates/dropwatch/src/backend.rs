//! Runtime-selected backends.
//!
//! The binary picks its state store and account directory from
//! configuration; these enums give the engine and scheduler one concrete
//! type for each regardless of the choice.

use std::time::Duration;

use dropwatch_core::{
  account::Account,
  source::{AccountDirectory, ChangeCallback},
  state::{MemoryStore, StateSnapshot},
  store::StateStore,
};
use dropwatch_http::RemoteDirectory;
use dropwatch_store_file::JsonFileStore;
use dropwatch_store_sqlite::SqliteStore;
use reqwest::Client;

use crate::{
  config::{DirectoryConfig, DirectorySource, StateBackend, StateConfig},
  directory::StaticDirectory,
  error::{BackendError, Error, Result},
};

// ─── State store ─────────────────────────────────────────────────────────────

pub enum StoreBackend {
  File(JsonFileStore),
  Sqlite(SqliteStore),
  Memory(MemoryStore),
}

impl StoreBackend {
  /// Open the store described by `config`.
  pub async fn open(config: &StateConfig) -> Result<Self, BackendError> {
    Ok(match config.backend {
      StateBackend::File => Self::File(JsonFileStore::new(&config.path)),
      StateBackend::Sqlite => Self::Sqlite(SqliteStore::open(&config.path).await?),
      StateBackend::Memory => Self::Memory(MemoryStore::new()),
    })
  }
}

impl StateStore for StoreBackend {
  type Error = BackendError;

  async fn load(&self) -> Result<StateSnapshot, BackendError> {
    match self {
      Self::File(store) => Ok(store.load().await?),
      Self::Sqlite(store) => Ok(store.load().await?),
      Self::Memory(store) => store.load().await.map_err(|e| match e {}),
    }
  }

  async fn save(&self, snapshot: &StateSnapshot) -> Result<(), BackendError> {
    match self {
      Self::File(store) => Ok(store.save(snapshot).await?),
      Self::Sqlite(store) => Ok(store.save(snapshot).await?),
      Self::Memory(store) => store.save(snapshot).await.map_err(|e| match e {}),
    }
  }
}

// ─── Account directory ───────────────────────────────────────────────────────

pub enum DirectoryBackend {
  Static(StaticDirectory),
  Remote(RemoteDirectory),
}

impl DirectoryBackend {
  /// Build the directory described by `config`.
  ///
  /// Fails when a remote source has no URL.
  pub fn from_config(config: &DirectoryConfig, client: Client) -> Result<Self> {
    match config.source {
      DirectorySource::Static => {
        Ok(Self::Static(StaticDirectory::new(config.accounts.clone())))
      }
      DirectorySource::Remote => {
        let url = config.url.clone().ok_or_else(|| {
          Error::InvalidConfig("directory.url is required for a remote directory".into())
        })?;
        Ok(Self::Remote(RemoteDirectory::new(
          client,
          url,
          config.api_token.clone(),
          Duration::from_secs(config.watch_interval_secs),
        )))
      }
    }
  }
}

impl AccountDirectory for DirectoryBackend {
  type Error = BackendError;

  async fn resolve(&self) -> Result<Vec<Account>, BackendError> {
    match self {
      Self::Static(dir) => dir.resolve().await.map_err(|e| match e {}),
      Self::Remote(dir) => Ok(dir.resolve().await?),
    }
  }

  fn watch_for_changes(&self, on_change: ChangeCallback) {
    match self {
      Self::Static(dir) => dir.watch_for_changes(on_change),
      Self::Remote(dir) => dir.watch_for_changes(on_change),
    }
  }
}
