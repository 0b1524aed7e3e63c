//! Error type for `dropwatch-http`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("{url} → {status}")]
  Status { url: String, status: StatusCode },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("push delivery rejected: {0}")]
  Rejected(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
