//! [`JsonFileStore`]: the file implementation of [`StateStore`].

use std::{
  io::{ErrorKind, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use dropwatch_core::{state::StateSnapshot, store::StateStore};
use tempfile::NamedTempFile;
use tokio::{fs, sync::Mutex};

use crate::{Error, Result};

/// A state store backed by a single JSON file.
pub struct JsonFileStore {
  path:       PathBuf,
  /// Serialises writers. The guard travels into the blocking write, so a
  /// caller that gives up on a save still holds off the next one until the
  /// rename has landed.
  write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
  /// Point the store at `path`. Nothing is touched until the first `load`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write_lock: Arc::new(Mutex::new(())) }
  }

  pub fn path(&self) -> &Path { &self.path }

  async fn read(&self) -> Result<Option<StateSnapshot>> {
    let raw = match fs::read(&self.path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(Error::io(&self.path, e)),
    };
    Ok(Some(serde_json::from_slice(&raw)?))
  }

  async fn write_atomic(&self, snapshot: &StateSnapshot) -> Result<()> {
    let body = serde_json::to_vec_pretty(snapshot)?;
    let path = self.path.clone();
    let guard = Arc::clone(&self.write_lock).lock_owned().await;

    tokio::task::spawn_blocking(move || {
      let _guard = guard;
      persist(&path, &body)
    })
    .await?
  }
}

/// Write `body` to a fresh temporary file next to `path`, sync it, and
/// rename it into place.
fn persist(path: &Path, body: &[u8]) -> Result<()> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

  let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
  tmp.write_all(body).map_err(|e| Error::io(tmp.path(), e))?;
  tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
  tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
  Ok(())
}

impl StateStore for JsonFileStore {
  type Error = Error;

  async fn load(&self) -> Result<StateSnapshot> {
    match self.read().await {
      Ok(Some(snapshot)) => {
        tracing::debug!(
          path = %self.path.display(),
          accounts = snapshot.len(),
          "loaded state file"
        );
        Ok(snapshot)
      }
      Ok(None) => {
        tracing::info!(
          path = %self.path.display(),
          "state file missing; initialising empty"
        );
        let empty = StateSnapshot::new();
        self.write_atomic(&empty).await?;
        Ok(empty)
      }
      Err(e) => {
        tracing::warn!(
          path = %self.path.display(),
          error = %e,
          "state file unreadable; re-initialising empty"
        );
        let empty = StateSnapshot::new();
        self.write_atomic(&empty).await?;
        Ok(empty)
      }
    }
  }

  async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
    self.write_atomic(snapshot).await
  }
}
