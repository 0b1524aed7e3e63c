//! Core types and trait definitions for dropwatch.
//!
//! This crate has no HTTP or database dependencies. The collaborators the
//! reconciliation engine talks to (inventory source, price source, notifier,
//! state store, account directory) are expressed here as traits whose methods
//! return `Send` futures; backends implement them with plain `async fn`.

pub mod account;
pub mod control;
pub mod error;
pub mod item;
pub mod notify;
pub mod source;
pub mod state;
pub mod store;

pub use error::FetchError;
