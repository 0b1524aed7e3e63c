//! The per-account "last seen" snapshot.
//!
//! The snapshot is not a ledger: after each successful poll an account's
//! entry is replaced wholesale with the item ids observed in that poll, so
//! items that leave the inventory are forgotten and count as new if they
//! come back.

use std::{
  collections::{BTreeMap, BTreeSet},
  convert::Infallible,
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
};

use serde::{Deserialize, Serialize};

use crate::{account::AccountId, item::ItemId, store::StateStore};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Mapping of account id → item ids seen in that account's last poll.
///
/// Serialises as a flat JSON object of string arrays, e.g.
/// `{"7656…": ["1234", "5678"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
  accounts: BTreeMap<AccountId, BTreeSet<ItemId>>,
}

impl StateSnapshot {
  pub fn new() -> Self { Self::default() }

  /// Items seen in `account`'s last successful poll, or `None` if the account
  /// has never been polled successfully.
  pub fn seen(&self, account: &AccountId) -> Option<&BTreeSet<ItemId>> {
    self.accounts.get(account)
  }

  pub fn contains_account(&self, account: &AccountId) -> bool {
    self.accounts.contains_key(account)
  }

  /// Replace `account`'s entry, returning the previous one.
  pub fn replace(
    &mut self,
    account: AccountId,
    items: BTreeSet<ItemId>,
  ) -> Option<BTreeSet<ItemId>> {
    self.accounts.insert(account, items)
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &BTreeSet<ItemId>)> {
    self.accounts.iter()
  }
}

impl FromIterator<(AccountId, BTreeSet<ItemId>)> for StateSnapshot {
  fn from_iter<T: IntoIterator<Item = (AccountId, BTreeSet<ItemId>)>>(
    iter: T,
  ) -> Self {
    Self { accounts: iter.into_iter().collect() }
  }
}

// ─── In-memory store ─────────────────────────────────────────────────────────

/// A [`StateStore`] that keeps the snapshot in process memory.
///
/// Nothing survives a restart; useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
  snapshot: Mutex<StateSnapshot>,
  saves:    AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
    Self { snapshot: Mutex::new(snapshot), saves: AtomicUsize::new(0) }
  }

  /// A copy of the currently stored snapshot.
  pub fn snapshot(&self) -> StateSnapshot {
    self
      .snapshot
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Number of completed `save` calls.
  pub fn saves(&self) -> usize { self.saves.load(Ordering::SeqCst) }
}

impl StateStore for MemoryStore {
  type Error = Infallible;

  async fn load(&self) -> Result<StateSnapshot, Infallible> {
    Ok(self.snapshot())
  }

  async fn save(&self, snapshot: &StateSnapshot) -> Result<(), Infallible> {
    *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) =
      snapshot.clone();
    self.saves.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(raw: &[&str]) -> BTreeSet<ItemId> {
    raw.iter().map(|s| ItemId::from(*s)).collect()
  }

  #[test]
  fn serialises_as_flat_object() {
    let mut snap = StateSnapshot::new();
    snap.replace(AccountId::from("alice"), ids(&["2", "1"]));
    let json = serde_json::to_string(&snap).unwrap();
    assert_eq!(json, r#"{"alice":["1","2"]}"#);

    let back: StateSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snap);
  }

  #[test]
  fn replace_returns_previous_entry() {
    let mut snap = StateSnapshot::new();
    let alice = AccountId::from("alice");
    assert!(snap.replace(alice.clone(), ids(&["1"])).is_none());
    let prev = snap.replace(alice.clone(), ids(&["2"])).unwrap();
    assert_eq!(prev, ids(&["1"]));
    assert_eq!(snap.seen(&alice), Some(&ids(&["2"])));
  }

  #[test]
  fn empty_entry_still_marks_account_as_known() {
    let mut snap = StateSnapshot::new();
    let bob = AccountId::from("bob");
    snap.replace(bob.clone(), BTreeSet::new());
    assert!(snap.contains_account(&bob));
  }

  #[tokio::test]
  async fn memory_store_round_trips_and_counts_saves() {
    let store = MemoryStore::new();
    assert!(store.load().await.unwrap().is_empty());

    let mut snap = StateSnapshot::new();
    snap.replace(AccountId::from("alice"), ids(&["1"]));
    store.save(&snap).await.unwrap();

    assert_eq!(store.load().await.unwrap(), snap);
    assert_eq!(store.saves(), 1);
  }
}
