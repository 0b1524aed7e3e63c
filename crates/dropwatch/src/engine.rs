//! The poll-cycle engine.
//!
//! One [`Engine::run_cycle`] call fetches every account's inventory, diffs
//! the classified drops against the stored snapshot, persists the new
//! snapshot after each account, and notifies on drops that are new for an
//! already-baselined account.
//!
//! Accounts fan out on a [`JoinSet`] bounded by a [`Semaphore`]. The
//! snapshot lives behind a single async mutex; the diff, the replace, and the
//! save for one account all happen under that lock, so saves never race.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use dropwatch_classify::classify_all;
use dropwatch_core::{
  FetchError,
  account::Account,
  control::CycleReport,
  item::ClassifiedDrop,
  notify::PRICE_UNAVAILABLE,
  source::{InventorySource, Notifier, PriceSource},
  state::StateSnapshot,
  store::StateStore,
};
use tokio::{
  sync::{Mutex, Semaphore},
  task::JoinSet,
  time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::{diff::reconcile, payload::build_payload};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Knobs for one [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Item-count cap passed to every inventory fetch.
  pub item_cap:        u32,
  /// Maximum number of accounts processed at once.
  pub max_concurrency: usize,
  /// Bound on every collaborator call.
  pub request_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      item_cap:        2000,
      max_concurrency: 4,
      request_timeout: Duration::from_secs(30),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a call to [`Engine::run_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
  Completed(CycleReport),
  /// Another cycle was already in flight on this engine.
  Skipped,
}

impl CycleOutcome {
  pub fn report(&self) -> Option<&CycleReport> {
    match self {
      Self::Completed(report) => Some(report),
      Self::Skipped => None,
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

struct Inner<I, P, N, S> {
  inventory: I,
  prices:    P,
  notifier:  N,
  store:     S,
  config:    EngineConfig,
  in_flight: AtomicBool,
}

/// Reconciliation engine over its four collaborators.
///
/// Cheap to clone; clones share collaborators and the in-flight flag.
pub struct Engine<I, P, N, S> {
  inner: Arc<Inner<I, P, N, S>>,
}

impl<I, P, N, S> Clone for Engine<I, P, N, S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(flag))
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

impl<I, P, N, S> Engine<I, P, N, S>
where
  I: InventorySource + 'static,
  P: PriceSource + 'static,
  N: Notifier + 'static,
  S: StateStore + 'static,
{
  pub fn new(
    inventory: I,
    prices: P,
    notifier: N,
    store: S,
    config: EngineConfig,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        inventory,
        prices,
        notifier,
        store,
        config,
        in_flight: AtomicBool::new(false),
      }),
    }
  }

  pub fn config(&self) -> &EngineConfig { &self.inner.config }

  pub fn store(&self) -> &S { &self.inner.store }

  pub fn notifier(&self) -> &N { &self.inner.notifier }

  /// Whether a cycle is currently in flight.
  pub fn is_running(&self) -> bool {
    self.inner.in_flight.load(Ordering::Acquire)
  }

  /// Run one full cycle over `accounts`.
  ///
  /// Returns [`CycleOutcome::Skipped`] without touching anything when a
  /// cycle is already running on this engine.
  pub async fn run_cycle(&self, accounts: Vec<Account>) -> CycleOutcome {
    let Some(_guard) = InFlight::acquire(&self.inner.in_flight) else {
      debug!("cycle already in flight; skipping");
      return CycleOutcome::Skipped;
    };

    let mut report =
      CycleReport { started_at: Some(Utc::now()), ..Default::default() };
    let snapshot = Arc::new(Mutex::new(self.load_snapshot().await));
    let limiter =
      Arc::new(Semaphore::new(self.inner.config.max_concurrency.max(1)));

    debug!(count = accounts.len(), "cycle started");
    let mut tasks = JoinSet::new();
    for account in accounts {
      let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
        break;
      };
      let inner = Arc::clone(&self.inner);
      let snapshot = Arc::clone(&snapshot);
      tasks.spawn(async move {
        let _permit = permit;
        process_account(&inner, &snapshot, account).await
      });
    }

    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok(account_report) => report.absorb(&account_report),
        Err(e) => {
          error!(error = %e, "account task failed");
          report.accounts_skipped += 1;
        }
      }
    }

    report.finished_at = Some(Utc::now());
    info!(
      polled = report.accounts_polled,
      skipped = report.accounts_skipped,
      baselined = report.accounts_baselined,
      new_items = report.new_items,
      sent = report.notifications_sent,
      "cycle finished"
    );
    CycleOutcome::Completed(report)
  }

  async fn load_snapshot(&self) -> StateSnapshot {
    match timeout(self.inner.config.request_timeout, self.inner.store.load())
      .await
    {
      Ok(Ok(snapshot)) => snapshot,
      Ok(Err(e)) => {
        warn!(error = %e, "state load failed; starting from an empty snapshot");
        StateSnapshot::new()
      }
      Err(_) => {
        warn!("state load timed out; starting from an empty snapshot");
        StateSnapshot::new()
      }
    }
  }
}

// ─── Per-account work ────────────────────────────────────────────────────────

async fn process_account<I, P, N, S>(
  inner: &Inner<I, P, N, S>,
  snapshot: &Mutex<StateSnapshot>,
  account: Account,
) -> CycleReport
where
  I: InventorySource,
  P: PriceSource,
  N: Notifier,
  S: StateStore,
{
  let mut report = CycleReport::default();
  let id = &account.account_id;
  let request_timeout = inner.config.request_timeout;

  let fetched = timeout(
    request_timeout,
    inner.inventory.fetch(id, inner.config.item_cap),
  )
  .await
  .unwrap_or(Err(FetchError::Timeout));
  let page = match fetched {
    Ok(page) => page,
    Err(e) => {
      warn!(account = %id, error = %e, "inventory fetch failed; skipping account");
      report.accounts_skipped = 1;
      return report;
    }
  };

  let drops = classify_all(&page.observed_items());

  let reconciliation = {
    let mut snapshot = snapshot.lock().await;
    let reconciliation = reconcile(snapshot.seen(id), drops);
    snapshot.replace(id.clone(), reconciliation.current_ids());
    match timeout(request_timeout, inner.store.save(&snapshot)).await {
      Ok(Ok(())) => {}
      Ok(Err(e)) => {
        error!(account = %id, error = %e, "failed to persist state");
        report.save_failures += 1;
      }
      Err(_) => {
        error!(account = %id, "state save timed out");
        report.save_failures += 1;
      }
    }
    reconciliation
  };
  report.accounts_polled = 1;

  if reconciliation.is_new_account {
    report.accounts_baselined = 1;
    info!(
      account = %id,
      count = reconciliation.current.len(),
      "new account; baseline captured, not notifying"
    );
    for souvenir in &reconciliation.current {
      info!(account = %id, item = %souvenir.item_id, "baseline: {}", souvenir.market_key);
    }
    return report;
  }

  report.new_items = reconciliation.new_drops.len();
  for souvenir in &reconciliation.new_drops {
    notify_drop(inner, &account, souvenir, &mut report).await;
  }
  report
}

async fn notify_drop<I, P, N, S>(
  inner: &Inner<I, P, N, S>,
  account: &Account,
  souvenir: &ClassifiedDrop,
  report: &mut CycleReport,
) where
  P: PriceSource,
  N: Notifier,
{
  let id = &account.account_id;
  let request_timeout = inner.config.request_timeout;

  let price =
    match timeout(request_timeout, inner.prices.lowest_price(&souvenir.market_key))
      .await
    {
      Ok(Ok(quote)) => quote.display().to_string(),
      Ok(Err(e)) => {
        warn!(account = %id, item = %souvenir.item_id, error = %e, "price lookup failed");
        PRICE_UNAVAILABLE.to_string()
      }
      Err(_) => {
        warn!(account = %id, item = %souvenir.item_id, "price lookup timed out");
        PRICE_UNAVAILABLE.to_string()
      }
    };

  let payload = build_payload(account, souvenir, &price);
  let mut delivered = 0usize;
  for target in &account.notify_targets {
    match timeout(request_timeout, inner.notifier.notify(target, &payload)).await
    {
      Ok(Ok(())) => delivered += 1,
      Ok(Err(e)) => {
        warn!(account = %id, item = %souvenir.item_id, error = %e, "notification failed");
        report.notification_failures += 1;
      }
      Err(_) => {
        warn!(account = %id, item = %souvenir.item_id, "notification timed out");
        report.notification_failures += 1;
      }
    }
  }
  report.notifications_sent += delivered;

  info!(
    account = %id,
    item = %souvenir.item_id,
    price = %price,
    recipients = delivered,
    "new drop: {} {} {}",
    souvenir.event,
    souvenir.year,
    souvenir.location
  );
}
