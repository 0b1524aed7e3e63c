//! Remote account directory with change detection.
//!
//! The directory is a JSON document served over HTTP, either an array of
//! accounts or an object keyed by an arbitrary record id. Changes are
//! detected by polling the document and comparing SHA-256 digests of the
//! raw body.

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use dropwatch_core::{
  account::Account,
  source::{AccountDirectory, ChangeCallback},
};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// An [`AccountDirectory`] backed by a JSON document at a URL.
pub struct RemoteDirectory {
  client:         Client,
  url:            String,
  api_token:      Option<String>,
  watch_interval: Duration,
  /// Digest of the body behind the most recent resolve or watch poll.
  last_digest:    Arc<Mutex<Option<String>>>,
  watcher:        Mutex<Option<JoinHandle<()>>>,
}

impl RemoteDirectory {
  pub fn new(
    client: Client,
    url: impl Into<String>,
    api_token: Option<String>,
    watch_interval: Duration,
  ) -> Self {
    Self {
      client,
      url: url.into(),
      api_token,
      watch_interval,
      last_digest: Arc::new(Mutex::new(None)),
      watcher: Mutex::new(None),
    }
  }
}

impl Drop for RemoteDirectory {
  fn drop(&mut self) {
    if let Some(handle) = self
      .watcher
      .get_mut()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
    {
      handle.abort();
    }
  }
}

async fn fetch_body(
  client: &Client,
  url: &str,
  api_token: Option<&str>,
) -> Result<Vec<u8>> {
  let mut req = client.get(url);
  if let Some(token) = api_token {
    req = req.bearer_auth(token);
  }
  let resp = req.send().await?;
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status { url: url.to_string(), status });
  }
  Ok(resp.bytes().await?.to_vec())
}

/// Record `digest` and report whether it differs from a previously recorded
/// one. The first digest ever recorded is not a change.
fn record_digest(slot: &Mutex<Option<String>>, digest: String) -> bool {
  let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
  let changed = guard.as_ref().is_some_and(|prev| *prev != digest);
  *guard = Some(digest);
  changed
}

impl AccountDirectory for RemoteDirectory {
  type Error = Error;

  async fn resolve(&self) -> Result<Vec<Account>> {
    let body =
      fetch_body(&self.client, &self.url, self.api_token.as_deref()).await?;
    let accounts = parse_directory(&body)?;
    record_digest(&self.last_digest, digest(&body));
    tracing::debug!(count = accounts.len(), "resolved remote directory");
    Ok(accounts)
  }

  fn watch_for_changes(&self, on_change: ChangeCallback) {
    let client = self.client.clone();
    let url = self.url.clone();
    let token = self.api_token.clone();
    let interval = self.watch_interval;
    let last_digest = Arc::clone(&self.last_digest);

    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      // The first tick completes immediately; the initial resolve has
      // already recorded a digest.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        match fetch_body(&client, &url, token.as_deref()).await {
          Ok(body) => {
            if record_digest(&last_digest, digest(&body)) {
              tracing::info!("remote directory changed");
              on_change();
            }
          }
          Err(e) => {
            tracing::warn!(error = %e, "remote directory watch poll failed");
          }
        }
      }
    });

    let previous = self
      .watcher
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .replace(handle);
    if let Some(previous) = previous {
      previous.abort();
    }
  }
}

// ─── Document format ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectoryDocument {
  List(Vec<Account>),
  Keyed(BTreeMap<String, Account>),
}

/// Decode a directory document into accounts, in document order (key order
/// for the keyed form).
pub fn parse_directory(body: &[u8]) -> Result<Vec<Account>> {
  let doc: DirectoryDocument = serde_json::from_slice(body)?;
  Ok(match doc {
    DirectoryDocument::List(accounts) => accounts,
    DirectoryDocument::Keyed(map) => map.into_values().collect(),
  })
}

/// Hex SHA-256 of a directory body.
pub fn digest(body: &[u8]) -> String {
  hex::encode(Sha256::digest(body))
}

#[cfg(test)]
mod tests {
  use dropwatch_core::account::AccountId;

  use super::*;

  #[test]
  fn parses_list_form() {
    let body = br#"[
      {"account_id":"1","display_name":"alice","notify_targets":["a","b"]},
      {"account_id":"2","display_name":"bob"}
    ]"#;
    let accounts = parse_directory(body).unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].notify_targets.len(), 2);
    assert!(accounts[1].notify_targets.is_empty());
  }

  #[test]
  fn parses_keyed_form_with_aliases() {
    let body = br#"{
      "u2": {"steam_id":"2","name":"bob","push_tokens":[]},
      "u1": {"steam_id":"1","name":"alice","push_tokens":["t"]}
    }"#;
    let accounts = parse_directory(body).unwrap();
    assert_eq!(accounts[0].account_id, AccountId::from("1"));
    assert_eq!(accounts[1].display_name, "bob");
  }

  #[test]
  fn rejects_unrelated_json() {
    assert!(parse_directory(br#""hello""#).is_err());
  }

  #[test]
  fn digest_is_stable_and_content_sensitive() {
    assert_eq!(digest(b"[]"), digest(b"[]"));
    assert_ne!(digest(b"[]"), digest(b"[ ]"));
    assert_eq!(digest(b"").len(), 64);
  }

  #[test]
  fn first_digest_is_not_a_change() {
    let slot = Mutex::new(None);
    assert!(!record_digest(&slot, "a".into()));
    assert!(!record_digest(&slot, "a".into()));
    assert!(record_digest(&slot, "b".into()));
    assert!(!record_digest(&slot, "b".into()));
  }
}
