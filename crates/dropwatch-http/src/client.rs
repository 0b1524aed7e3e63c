//! Shared [`reqwest::Client`] construction.

use std::time::Duration;

use reqwest::Client;

use crate::{Error, Result};

/// Settings shared by every upstream client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
  /// Hard bound on every request, connect to last byte.
  pub timeout:    Duration,
  pub user_agent: String,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      timeout:    Duration::from_secs(30),
      user_agent: concat!("dropwatch/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

/// Build a client honouring `config`.
///
/// The inner [`reqwest::Client`] is `Arc`-based and cheap to clone; one
/// client is normally shared by all collaborators.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
  Client::builder()
    .timeout(config.timeout)
    .user_agent(config.user_agent.clone())
    .build()
    .map_err(Error::Build)
}

/// Join `base` and `path` with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
  format!(
    "{}/{}",
    base.trim_end_matches('/'),
    path.trim_start_matches('/')
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_url_normalises_slashes() {
    assert_eq!(join_url("https://a.example/", "/x/y"), "https://a.example/x/y");
    assert_eq!(join_url("https://a.example", "x"), "https://a.example/x");
  }
}
