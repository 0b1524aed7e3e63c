//! The dropwatch daemon.
//!
//! Polls tracked accounts' inventories, reconciles souvenir package drops
//! against the last stored snapshot, and pushes a priced notification for
//! every drop that is new on an already-baselined account.
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | One reconciliation cycle over a list of accounts |
//! | [`scheduler`] | Interval, trigger, and restart-driven loop around the engine |
//! | [`diff`] | Pure reconciliation of one account's drops |
//! | [`payload`] | Notification payload and inventory deep link |
//! | [`config`] | Layered daemon configuration |
//! | [`backend`] | Runtime-selected store and directory backends |

pub mod backend;
pub mod config;
pub mod diff;
pub mod directory;
pub mod engine;
pub mod error;
pub mod payload;
pub mod scheduler;

pub use engine::{CycleOutcome, Engine, EngineConfig};
pub use error::{BackendError, Error, Result};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
