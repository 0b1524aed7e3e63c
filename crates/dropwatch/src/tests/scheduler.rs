use std::time::Duration;

use dropwatch_core::{
  account::Account,
  control::{PollControl, SchedulerStatus},
  state::MemoryStore,
};
use tokio::{sync::watch, task::JoinHandle};

use super::fakes::{FakeDirectory, FakeInventory, FakePrices, RecordingNotifier, page};
use crate::{
  engine::{Engine, EngineConfig},
  scheduler::{Scheduler, SchedulerConfig, SchedulerHandle},
};

const KATOWICE: &str = "ESL One Katowice 2019 Dust II Souvenir Package";
const INTERVAL: Duration = Duration::from_secs(60 * 60);

type TestScheduler =
  Scheduler<FakeDirectory, FakeInventory, FakePrices, RecordingNotifier, MemoryStore>;

struct Running {
  directory: FakeDirectory,
  inventory: FakeInventory,
  handle:    SchedulerHandle,
  shutdown:  watch::Sender<bool>,
  task:      JoinHandle<()>,
}

fn account(id: &str) -> Account { Account::new(id, id, vec!["tok".into()]) }

fn scheduler(
  directory: &FakeDirectory,
  inventory: &FakeInventory,
  start_idle: bool,
) -> TestScheduler {
  // Long enough that only the test's own sleeps move the paused clock past it.
  let request_timeout = Duration::from_secs(24 * 60 * 60);
  let engine = Engine::new(
    inventory.clone(),
    FakePrices::default(),
    RecordingNotifier::default(),
    MemoryStore::new(),
    EngineConfig { request_timeout, ..Default::default() },
  );
  Scheduler::new(directory.clone(), engine, SchedulerConfig {
    interval: INTERVAL,
    start_idle,
    resolve_timeout: request_timeout,
  })
}

fn spawn(accounts: Vec<Account>, start_idle: bool) -> Running {
  let directory = FakeDirectory::new(accounts);
  let inventory = FakeInventory::default();
  let scheduler = scheduler(&directory, &inventory, start_idle);
  let handle = scheduler.handle();
  let (shutdown, rx) = watch::channel(false);
  let task = tokio::spawn(scheduler.run(rx));
  Running { directory, inventory, handle, shutdown, task }
}

/// Poll `cond` against the scheduler status, advancing the paused clock in
/// small steps.
async fn wait_for(handle: &SchedulerHandle, cond: impl Fn(&SchedulerStatus) -> bool) {
  for _ in 0..500 {
    if cond(&handle.status()) {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("condition not reached; last status: {:?}", handle.status());
}

async fn settle() { tokio::time::sleep(Duration::from_millis(100)).await; }

#[tokio::test(start_paused = true)]
async fn first_cycle_runs_immediately() {
  let r = spawn(vec![account("a"), account("b")], false);

  wait_for(&r.handle, |s| s.cycles_completed == 1).await;

  let status = r.handle.status();
  assert!(status.running);
  assert_eq!(status.tracked_accounts, 2);
  assert_eq!(status.last_report.unwrap().accounts_baselined, 2);
  assert!(status.next_tick_at.is_some());
  assert!(r.directory.is_watched());
}

#[tokio::test(start_paused = true)]
async fn interval_drives_subsequent_cycles() {
  let r = spawn(vec![account("a")], false);
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;

  tokio::time::sleep(INTERVAL / 2).await;
  assert_eq!(r.handle.status().cycles_completed, 1);

  tokio::time::sleep(INTERVAL / 2).await;
  wait_for(&r.handle, |s| s.cycles_completed == 2).await;
  assert_eq!(r.inventory.calls(), vec!["a", "a"]);
}

#[tokio::test(start_paused = true)]
async fn idle_scheduler_waits_for_start() {
  let r = spawn(vec![account("a")], true);

  tokio::time::sleep(INTERVAL * 3).await;
  let status = r.handle.status();
  assert!(!status.running);
  assert_eq!(status.cycles_completed, 0);
  assert!(r.inventory.calls().is_empty());

  r.handle.start();
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;
  assert!(r.handle.status().running);
}

#[tokio::test(start_paused = true)]
async fn stop_pauses_ticks_until_started_again() {
  let r = spawn(vec![account("a")], false);
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;

  r.handle.stop();
  assert!(!r.handle.status().running);
  tokio::time::sleep(INTERVAL * 3).await;
  assert_eq!(r.handle.status().cycles_completed, 1);
  assert_eq!(r.handle.status().next_tick_at, None);

  r.handle.start();
  wait_for(&r.handle, |s| s.cycles_completed == 2).await;
}

#[tokio::test(start_paused = true)]
async fn trigger_runs_a_cycle_without_waiting_for_the_interval() {
  let r = spawn(vec![account("a")], false);
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;

  let before = tokio::time::Instant::now();
  r.handle.trigger();
  wait_for(&r.handle, |s| s.cycles_completed == 2).await;
  assert!(before.elapsed() < INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn trigger_keeps_the_interval_deadline() {
  let r = spawn(vec![account("a")], false);
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;
  let scheduled = r.handle.status().next_tick_at.unwrap();

  tokio::time::sleep(Duration::from_secs(20 * 60)).await;
  r.handle.trigger();
  wait_for(&r.handle, |s| s.cycles_completed == 2).await;

  // The paused clock moved 20 minutes; the wall clock barely moved. The
  // timer still fires at the original deadline, 40 minutes from now.
  let next = r.handle.status().next_tick_at.unwrap();
  let remaining = next - chrono::Utc::now();
  assert!(next < scheduled);
  assert!(remaining > chrono::Duration::minutes(39));
  assert!(remaining <= chrono::Duration::minutes(40));
}

#[tokio::test(start_paused = true)]
async fn trigger_works_while_paused() {
  let r = spawn(vec![account("a")], true);
  settle().await;

  r.handle.trigger();
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;
  assert!(!r.handle.status().running);
}

#[tokio::test(start_paused = true)]
async fn trigger_during_a_cycle_is_queued_not_overlapped() {
  let directory = FakeDirectory::new(vec![account("a")]);
  let inventory = FakeInventory::default();
  let gate = inventory.gate();
  let scheduler = scheduler(&directory, &inventory, false);
  let handle = scheduler.handle();
  let (_shutdown, rx) = watch::channel(false);
  tokio::spawn(scheduler.run(rx));

  wait_for(&handle, |s| s.cycle_in_flight).await;
  handle.trigger();
  handle.trigger();
  settle().await;
  assert_eq!(inventory.calls().len(), 1);

  gate.add_permits(10);
  wait_for(&handle, |s| s.cycles_completed == 2).await;
  settle().await;
  assert_eq!(handle.status().cycles_completed, 2);
}

#[tokio::test(start_paused = true)]
async fn directory_change_mid_cycle_restarts_with_the_new_list() {
  let directory = FakeDirectory::new(vec![account("a")]);
  let inventory = FakeInventory::default();
  inventory.set("a", page(&[("1", KATOWICE)]));
  inventory.set("b", page(&[("2", KATOWICE)]));
  let gate = inventory.gate();
  let scheduler = scheduler(&directory, &inventory, false);
  let handle = scheduler.handle();
  let (_shutdown, rx) = watch::channel(false);
  tokio::spawn(scheduler.run(rx));

  wait_for(&handle, |s| s.cycle_in_flight).await;
  while inventory.calls().is_empty() {
    tokio::task::yield_now().await;
  }

  directory.set(vec![account("b")]);
  directory.fire();
  settle().await;
  assert_eq!(inventory.calls(), vec!["a"]);

  gate.add_permits(10);
  wait_for(&handle, |s| s.cycles_completed == 2).await;

  assert_eq!(inventory.calls(), vec!["a", "b"]);
  let status = handle.status();
  assert_eq!(status.tracked_accounts, 1);
  assert_eq!(status.last_report.unwrap().accounts_baselined, 1);
}

#[tokio::test(start_paused = true)]
async fn directory_change_while_idle_waits_for_start() {
  let r = spawn(vec![account("a")], true);
  settle().await;

  r.directory.fire();
  settle().await;
  assert_eq!(r.handle.status().cycles_completed, 0);

  r.handle.start();
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;
  settle().await;
  assert_eq!(r.handle.status().cycles_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn directory_failure_is_reported_and_retried() {
  let r = spawn(vec![account("a")], false);
  r.directory.fail("directory offline");

  wait_for(&r.handle, |s| s.last_error.is_some()).await;
  let status = r.handle.status();
  assert_eq!(status.cycles_completed, 0);
  assert!(status.last_error.unwrap().contains("directory offline"));
  assert!(r.inventory.calls().is_empty());

  r.directory.set(vec![account("a")]);
  tokio::time::sleep(INTERVAL).await;
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;
  assert_eq!(r.handle.status().last_error, None);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
  let r = spawn(vec![account("a")], false);
  wait_for(&r.handle, |s| s.cycles_completed == 1).await;

  r.shutdown.send(true).unwrap();
  tokio::time::timeout(Duration::from_secs(1), r.task)
    .await
    .expect("scheduler did not stop")
    .unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_the_in_flight_cycle_finish() {
  let directory = FakeDirectory::new(vec![account("a")]);
  let inventory = FakeInventory::default();
  let gate = inventory.gate();
  let scheduler = scheduler(&directory, &inventory, false);
  let handle = scheduler.handle();
  let (shutdown, rx) = watch::channel(false);
  let task = tokio::spawn(scheduler.run(rx));

  wait_for(&handle, |s| s.cycle_in_flight).await;
  shutdown.send(true).unwrap();
  settle().await;
  assert!(!task.is_finished());

  gate.add_permits(1);
  task.await.unwrap();
  assert_eq!(handle.status().cycles_completed, 1);
}

#[tokio::test]
async fn run_once_collapses_duplicate_accounts() {
  let directory = FakeDirectory::new(vec![
    Account::new("a", "first", vec![]),
    Account::new("b", "b", vec![]),
    Account::new("a", "second", vec![]),
  ]);
  let inventory = FakeInventory::default();
  let scheduler = scheduler(&directory, &inventory, false);

  let report = scheduler.run_once().await.unwrap();

  assert_eq!(report.accounts_polled, 2);
  let mut calls = inventory.calls();
  calls.sort();
  assert_eq!(calls, vec!["a", "b"]);
}

#[tokio::test]
async fn run_once_reports_directory_failure() {
  let directory = FakeDirectory::new(vec![]);
  directory.fail("nope");
  let inventory = FakeInventory::default();
  let scheduler = scheduler(&directory, &inventory, false);

  assert!(scheduler.run_once().await.is_none());
  assert!(scheduler.handle().status().last_error.is_some());
}
