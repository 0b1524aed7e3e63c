//! Daemon configuration.
//!
//! Layered with the `config` crate: an optional TOML file, then environment
//! variables prefixed `DROPWATCH` (nested keys separated by `__`, e.g.
//! `DROPWATCH__STEAM__CURRENCY=3`). CLI flags are applied on top by the
//! binary.

use std::{path::PathBuf, time::Duration};

use dropwatch_core::account::Account;
use serde::Deserialize;

use crate::{
  engine::EngineConfig,
  error::{Error, Result},
  scheduler::SchedulerConfig,
};

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
  pub interval_minutes:     u64,
  pub item_count:           u32,
  pub max_concurrency:      usize,
  pub request_timeout_secs: u64,
  pub shutdown_grace_secs:  u64,
  /// Start paused and wait for a remote start.
  pub start_idle:           bool,
  pub state:                StateConfig,
  pub directory:            DirectoryConfig,
  pub steam:                SteamConfig,
  pub push:                 PushConfig,
  pub control:              ControlConfig,
}

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      interval_minutes:     5,
      item_count:           2000,
      max_concurrency:      4,
      request_timeout_secs: 30,
      shutdown_grace_secs:  30,
      start_idle:           false,
      state:                StateConfig::default(),
      directory:            DirectoryConfig::default(),
      steam:                SteamConfig::default(),
      push:                 PushConfig::default(),
      control:              ControlConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
  File,
  Sqlite,
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
  pub backend: StateBackend,
  pub path:    PathBuf,
}

impl Default for StateConfig {
  fn default() -> Self {
    Self { backend: StateBackend::File, path: PathBuf::from("state.json") }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
  #[default]
  Static,
  Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
  pub source:              DirectorySource,
  /// Accounts for a static directory.
  pub accounts:            Vec<Account>,
  pub url:                 Option<String>,
  pub api_token:           Option<String>,
  pub watch_interval_secs: u64,
}

impl Default for DirectoryConfig {
  fn default() -> Self {
    Self {
      source:              DirectorySource::Static,
      accounts:            Vec::new(),
      url:                 None,
      api_token:           None,
      watch_interval_secs: 60,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
  pub community_url: String,
  /// Market currency code; 1 is USD.
  pub currency:      u32,
}

impl Default for SteamConfig {
  fn default() -> Self {
    Self { community_url: "https://steamcommunity.com".into(), currency: 1 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
  pub url:          String,
  pub access_token: Option<String>,
}

impl Default for PushConfig {
  fn default() -> Self {
    Self { url: "https://exp.host".into(), access_token: None }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
  pub enabled:       bool,
  pub host:          String,
  pub port:          u16,
  pub username:      Option<String>,
  /// argon2 PHC string; generate with `dropwatch --hash-password`.
  pub password_hash: Option<String>,
}

impl Default for ControlConfig {
  fn default() -> Self {
    Self {
      enabled:       false,
      host:          "127.0.0.1".into(),
      port:          8080,
      username:      None,
      password_hash: None,
    }
  }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Upper bound on `interval_minutes` (one week).
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl DaemonConfig {
  /// Read `path` (if it exists) layered under `DROPWATCH__*` variables.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.into()).required(false))
      .add_source(
        config::Environment::with_prefix("DROPWATCH")
          .prefix_separator("__")
          .separator("__"),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  /// Reject configurations the daemon cannot start with.
  pub fn validate(&self) -> Result<()> {
    if self.interval_minutes == 0 {
      return Err(Error::InvalidConfig("interval_minutes must be at least 1".into()));
    }
    if self.interval_minutes > MAX_INTERVAL_MINUTES {
      return Err(Error::InvalidConfig(format!(
        "interval_minutes must be at most {MAX_INTERVAL_MINUTES}"
      )));
    }
    if self.max_concurrency == 0 {
      return Err(Error::InvalidConfig("max_concurrency must be at least 1".into()));
    }
    if self.request_timeout_secs == 0 {
      return Err(Error::InvalidConfig(
        "request_timeout_secs must be at least 1".into(),
      ));
    }
    if self.directory.source == DirectorySource::Remote
      && self.directory.url.as_deref().is_none_or(str::is_empty)
    {
      return Err(Error::InvalidConfig(
        "directory.url is required when directory.source = \"remote\"".into(),
      ));
    }
    if self.directory.source == DirectorySource::Remote
      && self.directory.watch_interval_secs == 0
    {
      return Err(Error::InvalidConfig(
        "directory.watch_interval_secs must be at least 1".into(),
      ));
    }
    if self.control.enabled
      && (self.control.username.as_deref().is_none_or(str::is_empty)
        || self.control.password_hash.as_deref().is_none_or(str::is_empty))
    {
      return Err(Error::InvalidConfig(
        "control.username and control.password_hash are required when the control API is enabled"
          .into(),
      ));
    }
    Ok(())
  }

  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_minutes.saturating_mul(60))
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn shutdown_grace(&self) -> Duration {
    Duration::from_secs(self.shutdown_grace_secs)
  }

  pub fn engine(&self) -> EngineConfig {
    EngineConfig {
      item_cap:        self.item_count,
      max_concurrency: self.max_concurrency,
      request_timeout: self.request_timeout(),
    }
  }

  pub fn scheduler(&self) -> SchedulerConfig {
    SchedulerConfig {
      interval:        self.interval(),
      start_idle:      self.start_idle,
      resolve_timeout: self.request_timeout(),
    }
  }
}
