//! Collaborator traits the reconciliation engine depends on.
//!
//! Implemented by the HTTP backends in `dropwatch-http` and by in-process
//! fakes in tests. All methods return `Send` futures so implementations can
//! be driven from spawned tokio tasks.

use std::{future::Future, sync::Arc};

use crate::{
  FetchError,
  account::{Account, AccountId},
  item::InventoryPage,
  notify::{NotificationPayload, PriceQuote},
};

/// Called by an [`AccountDirectory`] whenever its contents change.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

// ─── Inventory ───────────────────────────────────────────────────────────────

/// Fetches the current inventory of one account.
pub trait InventorySource: Send + Sync {
  /// Return at most `item_cap` items for `account`.
  fn fetch<'a>(
    &'a self,
    account: &'a AccountId,
    item_cap: u32,
  ) -> impl Future<Output = Result<InventoryPage, FetchError>> + Send + 'a;
}

// ─── Price lookup ────────────────────────────────────────────────────────────

/// Looks up the lowest market price for an item.
///
/// A normal "not listed" answer is `Ok(PriceQuote::Unavailable)`, never an
/// error.
pub trait PriceSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn lowest_price<'a>(
    &'a self,
    market_key: &'a str,
  ) -> impl Future<Output = Result<PriceQuote, Self::Error>> + Send + 'a;
}

// ─── Notification ────────────────────────────────────────────────────────────

/// Delivers one push notification to one recipient token.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify<'a>(
    &'a self,
    target: &'a str,
    payload: &'a NotificationPayload,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Account directory ───────────────────────────────────────────────────────

/// Resolves the list of tracked accounts.
pub trait AccountDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve the current account list.
  fn resolve(
    &self,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  /// Register `on_change` to be called when the directory's contents change.
  ///
  /// Sources without push capability keep the default no-op.
  fn watch_for_changes(&self, on_change: ChangeCallback) { let _ = on_change; }
}
