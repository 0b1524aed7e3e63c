//! Error types for the dropwatch daemon library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of one of the runtime-selected backends.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error(transparent)]
  File(#[from] dropwatch_store_file::Error),

  #[error(transparent)]
  Sqlite(#[from] dropwatch_store_sqlite::Error),

  #[error(transparent)]
  Http(#[from] dropwatch_http::Error),
}
