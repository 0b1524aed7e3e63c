//! JSON-document backend for the dropwatch state store.
//!
//! The whole [`StateSnapshot`](dropwatch_core::state::StateSnapshot) lives in
//! one JSON file. Every save writes a fresh temporary file in the same
//! directory, syncs it, and renames it over the original, so readers only
//! ever see a complete document.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonFileStore;

#[cfg(test)]
mod tests;
