//! Error types for `dropwatch-core`.

use thiserror::Error;

/// Why an inventory could not be fetched for one account.
///
/// Every variant is recoverable: the account is skipped for the current cycle
/// and its stored state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The inventory is private or otherwise inaccessible to anonymous readers.
  #[error("inventory is private or inaccessible")]
  Private,

  /// Network failure, rate limiting, or an upstream 5xx.
  #[error("transient upstream failure: {0}")]
  Transient(String),

  /// The request did not complete within the configured bound.
  #[error("request timed out")]
  Timeout,

  /// The upstream answered, but not with something we can parse.
  #[error("malformed inventory payload: {0}")]
  Malformed(String),
}
