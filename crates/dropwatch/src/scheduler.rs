//! The polling loop.
//!
//! A [`Scheduler`] owns the account directory and an [`Engine`], and drives
//! cycles from a fixed interval, manual triggers, and directory-change
//! restarts. All scheduling state lives in one shared block so the remote
//! control surface can read and flip it through a [`SchedulerHandle`].
//!
//! A directory change never touches a cycle already in flight: it only sets a
//! flag, and once the current cycle finishes the loop re-resolves the
//! directory and runs a fresh cycle before going back to the timer.

use std::{
  sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use dropwatch_core::{
  account::dedupe_accounts,
  control::{CycleReport, PollControl, SchedulerStatus},
  source::{AccountDirectory, InventorySource, Notifier, PriceSource},
  store::StateStore,
};
use tokio::{
  sync::{Notify, watch},
  time::{Instant, MissedTickBehavior, interval, timeout},
};
use tracing::{debug, error, info};

use crate::engine::{CycleOutcome, Engine};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  /// Time between scheduled cycles.
  pub interval:        Duration,
  /// Start paused; ticks are ignored until [`PollControl::start`].
  pub start_idle:      bool,
  /// Bound on one directory resolution.
  pub resolve_timeout: Duration,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      interval:        Duration::from_secs(5 * 60),
      start_idle:      false,
      resolve_timeout: Duration::from_secs(30),
    }
  }
}

// ─── Shared state ────────────────────────────────────────────────────────────

struct Shared {
  running:           AtomicBool,
  trigger_requested: AtomicBool,
  restart_requested: AtomicBool,
  wake:              Notify,
  status:            RwLock<SchedulerStatus>,
}

impl Shared {
  fn update(&self, f: impl FnOnce(&mut SchedulerStatus)) {
    f(&mut self.status.write().unwrap_or_else(PoisonError::into_inner));
  }
}

/// Remote-control handle for a [`Scheduler`]. Cheap to clone.
#[derive(Clone)]
pub struct SchedulerHandle {
  shared: Arc<Shared>,
}

impl SchedulerHandle {
  /// Ask the loop to re-resolve the directory and run a fresh cycle once
  /// the current one, if any, has finished.
  pub fn request_restart(&self) {
    self.shared.restart_requested.store(true, Ordering::SeqCst);
    self.shared.wake.notify_one();
  }
}

impl PollControl for SchedulerHandle {
  fn status(&self) -> SchedulerStatus {
    self
      .shared
      .status
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn start(&self) {
    if !self.shared.running.swap(true, Ordering::SeqCst) {
      info!("polling started");
      self.shared.update(|s| s.running = true);
      self.shared.trigger_requested.store(true, Ordering::SeqCst);
      self.shared.wake.notify_one();
    }
  }

  fn stop(&self) {
    if self.shared.running.swap(false, Ordering::SeqCst) {
      info!("polling stopped");
      self.shared.update(|s| {
        s.running = false;
        s.next_tick_at = None;
      });
    }
  }

  fn trigger(&self) {
    debug!("cycle requested");
    self.shared.trigger_requested.store(true, Ordering::SeqCst);
    self.shared.wake.notify_one();
  }
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

pub struct Scheduler<D, I, P, N, S> {
  directory: D,
  engine:    Engine<I, P, N, S>,
  config:    SchedulerConfig,
  shared:    Arc<Shared>,
}

impl<D, I, P, N, S> Scheduler<D, I, P, N, S>
where
  D: AccountDirectory,
  I: InventorySource + 'static,
  P: PriceSource + 'static,
  N: Notifier + 'static,
  S: StateStore + 'static,
{
  pub fn new(
    directory: D,
    engine: Engine<I, P, N, S>,
    config: SchedulerConfig,
  ) -> Self {
    let running = !config.start_idle;
    Self {
      directory,
      engine,
      config,
      shared: Arc::new(Shared {
        running:           AtomicBool::new(running),
        trigger_requested: AtomicBool::new(false),
        restart_requested: AtomicBool::new(false),
        wake:              Notify::new(),
        status:            RwLock::new(SchedulerStatus {
          running,
          ..Default::default()
        }),
      }),
    }
  }

  pub fn handle(&self) -> SchedulerHandle {
    SchedulerHandle { shared: Arc::clone(&self.shared) }
  }

  pub fn engine(&self) -> &Engine<I, P, N, S> { &self.engine }

  /// Run exactly one cycle against a freshly resolved directory.
  ///
  /// Returns `None` when the directory could not be resolved or another
  /// cycle was in flight.
  pub async fn run_once(&self) -> Option<CycleReport> { self.run_one().await }

  /// Drive cycles until `shutdown` turns `true` or its sender is dropped.
  ///
  /// Shutdown is only observed between cycles; a cycle in flight always runs
  /// to completion.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let handle = self.handle();
    self
      .directory
      .watch_for_changes(Arc::new(move || handle.request_restart()));

    let period = self.config.interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // When `ticker` will next fire; the first tick is immediate.
    let mut deadline = Instant::now();
    info!(
      interval_secs = self.config.interval.as_secs(),
      running = self.shared.running.load(Ordering::SeqCst),
      "scheduler started"
    );

    loop {
      if *shutdown.borrow_and_update() {
        break;
      }

      let ticked = tokio::select! {
        biased;
        changed = shutdown.changed() => {
          if changed.is_err() {
            break;
          }
          continue;
        }
        _ = ticker.tick() => {
          deadline = next_deadline(deadline, period, Instant::now());
          true
        }
        _ = self.shared.wake.notified() => false,
      };

      let manual = self.shared.trigger_requested.swap(false, Ordering::SeqCst);
      let running = self.shared.running.load(Ordering::SeqCst);
      let restart = self.shared.restart_requested.load(Ordering::SeqCst);

      if manual || (running && (ticked || restart)) {
        let restarted = self.run_with_restarts(&shutdown).await;
        if restarted {
          ticker.reset();
          deadline = Instant::now() + period;
        }
      }
      self.schedule_next(deadline);
    }

    info!("scheduler stopped");
  }

  /// Run a cycle, then keep running fresh ones while restarts were requested
  /// during the previous one. Returns whether any restart was consumed.
  async fn run_with_restarts(&self, shutdown: &watch::Receiver<bool>) -> bool {
    let mut restarted = false;
    loop {
      if self.shared.restart_requested.swap(false, Ordering::SeqCst) {
        restarted = true;
        info!("account directory changed; running a fresh cycle");
      }
      self.run_one().await;
      if *shutdown.borrow()
        || !self.shared.restart_requested.load(Ordering::SeqCst)
        || !self.shared.running.load(Ordering::SeqCst)
      {
        return restarted;
      }
    }
  }

  async fn run_one(&self) -> Option<CycleReport> {
    let resolved =
      match timeout(self.config.resolve_timeout, self.directory.resolve()).await
      {
        Ok(Ok(accounts)) => Ok(dedupe_accounts(accounts)),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("timed out".to_string()),
      };
    let accounts = match resolved {
      Ok(accounts) => accounts,
      Err(e) => {
        error!(error = %e, "account directory resolution failed; retrying next tick");
        self.shared.update(|s| {
          s.last_error = Some(format!("directory resolution failed: {e}"));
        });
        return None;
      }
    };

    let tracked = accounts.len();
    self.shared.update(|s| {
      s.cycle_in_flight = true;
      s.tracked_accounts = tracked;
    });

    let outcome = self.engine.run_cycle(accounts).await;

    self.shared.update(|s| {
      s.cycle_in_flight = false;
      if let CycleOutcome::Completed(report) = &outcome {
        s.cycles_completed += 1;
        s.last_report = Some(report.clone());
        s.last_error = None;
      }
    });
    match outcome {
      CycleOutcome::Completed(report) => Some(report),
      CycleOutcome::Skipped => None,
    }
  }

  fn schedule_next(&self, deadline: Instant) {
    let next = self
      .shared
      .running
      .load(Ordering::SeqCst)
      .then(|| {
        chrono::Duration::from_std(
          deadline.saturating_duration_since(Instant::now()),
        )
        .ok()
      })
      .flatten()
      .map(|remaining| Utc::now() + remaining);
    self.shared.update(|s| s.next_tick_at = next);
  }
}

/// The deadline after a tick that was due at `due` fired at `now`, following
/// [`MissedTickBehavior::Skip`]: stay on the original grid, dropping any
/// ticks that were missed.
fn next_deadline(due: Instant, period: Duration, now: Instant) -> Instant {
  let behind = now.saturating_duration_since(due).as_nanos() % period.as_nanos();
  now + period - Duration::from_nanos(behind as u64)
}
