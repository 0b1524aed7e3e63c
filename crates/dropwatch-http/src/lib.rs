//! HTTP collaborators for dropwatch.
//!
//! Each client wraps a shared [`reqwest::Client`] and implements one of the
//! `dropwatch-core` collaborator traits:
//!
//! | Client | Trait |
//! |--------|-------|
//! | [`SteamInventoryClient`] | [`InventorySource`](dropwatch_core::source::InventorySource) |
//! | [`SteamMarketClient`] | [`PriceSource`](dropwatch_core::source::PriceSource) |
//! | [`ExpoPushClient`] | [`Notifier`](dropwatch_core::source::Notifier) |
//! | [`RemoteDirectory`] | [`AccountDirectory`](dropwatch_core::source::AccountDirectory) |
//!
//! Response decoding lives in plain functions so it can be tested without a
//! network.

pub mod client;
pub mod directory;
pub mod error;
pub mod inventory;
pub mod market;
pub mod push;

pub use client::{HttpConfig, build_client};
pub use directory::RemoteDirectory;
pub use error::{Error, Result};
pub use inventory::SteamInventoryClient;
pub use market::SteamMarketClient;
pub use push::ExpoPushClient;
