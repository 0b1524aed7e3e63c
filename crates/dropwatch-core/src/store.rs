//! The [`StateStore`] trait.
//!
//! Backends (`dropwatch-store-file`, `dropwatch-store-sqlite`, and the
//! in-memory [`MemoryStore`](crate::state::MemoryStore)) persist a whole
//! [`StateSnapshot`] at a time; there is no partial-key update.

use std::future::Future;

use crate::state::StateSnapshot;

/// Durable home of the per-account "last seen" snapshot.
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the latest durable snapshot.
  ///
  /// Implementations fail soft: a missing or unreadable backing resource is
  /// re-initialised as empty and an empty snapshot is returned. An `Err` is
  /// reserved for the case where even re-initialisation failed.
  fn load(
    &self,
  ) -> impl Future<Output = Result<StateSnapshot, Self::Error>> + Send + '_;

  /// Atomically replace the stored snapshot with `snapshot`.
  ///
  /// A crash during `save` must leave either the old or the new document,
  /// never a torn one.
  fn save<'a>(
    &'a self,
    snapshot: &'a StateSnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
