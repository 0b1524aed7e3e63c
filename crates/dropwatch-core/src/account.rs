//! Accounts: tracked external identities whose inventories are polled.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// Opaque identifier of a tracked account (a Steam64 id in practice).
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for AccountId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for AccountId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// One tracked account as resolved by an
/// [`AccountDirectory`](crate::source::AccountDirectory).
///
/// Never mutated by the engine; a fresh list is resolved for every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  #[serde(alias = "steam_id")]
  pub account_id:     AccountId,
  #[serde(alias = "name")]
  pub display_name:   String,
  /// Push delivery tokens, in registration order. May be empty.
  #[serde(default, alias = "push_tokens")]
  pub notify_targets: Vec<String>,
}

impl Account {
  pub fn new(
    account_id: impl Into<String>,
    display_name: impl Into<String>,
    notify_targets: Vec<String>,
  ) -> Self {
    Self {
      account_id: AccountId::new(account_id),
      display_name: display_name.into(),
      notify_targets,
    }
  }
}

/// Collapse duplicate account ids, last write wins.
///
/// The surviving entry keeps the position of its last occurrence so that a
/// malformed directory cannot make one account appear twice in a cycle.
pub fn dedupe_accounts(accounts: Vec<Account>) -> Vec<Account> {
  let mut last_index: HashMap<AccountId, usize> = HashMap::new();
  for (i, account) in accounts.iter().enumerate() {
    last_index.insert(account.account_id.clone(), i);
  }
  accounts
    .into_iter()
    .enumerate()
    .filter(|(i, a)| last_index.get(&a.account_id) == Some(i))
    .map(|(_, a)| a)
    .collect()
}
