//! Cycle reports, scheduler status, and the [`PollControl`] trait used by the
//! remote-control surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What one completed cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
  pub started_at:            Option<DateTime<Utc>>,
  pub finished_at:           Option<DateTime<Utc>>,
  /// Accounts whose inventory was fetched and reconciled.
  pub accounts_polled:       usize,
  /// Accounts skipped because the fetch failed.
  pub accounts_skipped:      usize,
  /// Accounts seen for the first time (baseline capture, no notification).
  pub accounts_baselined:    usize,
  pub new_items:             usize,
  pub notifications_sent:    usize,
  pub notification_failures: usize,
  pub save_failures:         usize,
}

impl CycleReport {
  /// Fold another account's counters into this report.
  pub fn absorb(&mut self, other: &CycleReport) {
    self.accounts_polled += other.accounts_polled;
    self.accounts_skipped += other.accounts_skipped;
    self.accounts_baselined += other.accounts_baselined;
    self.new_items += other.new_items;
    self.notifications_sent += other.notifications_sent;
    self.notification_failures += other.notification_failures;
    self.save_failures += other.save_failures;
  }
}

/// Externally visible state of the polling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
  /// `false` while paused (started idle or stopped remotely).
  pub running:          bool,
  pub cycle_in_flight:  bool,
  pub cycles_completed: u64,
  pub tracked_accounts: usize,
  pub last_report:      Option<CycleReport>,
  pub last_error:       Option<String>,
  pub next_tick_at:     Option<DateTime<Utc>>,
}

/// Remote start/stop/trigger signalling for a running scheduler.
pub trait PollControl: Send + Sync {
  fn status(&self) -> SchedulerStatus;

  /// Resume ticking. Idempotent.
  fn start(&self);

  /// Pause ticking after the in-flight cycle, if any. Idempotent.
  fn stop(&self);

  /// Request one cycle as soon as no other cycle is running.
  fn trigger(&self);
}
