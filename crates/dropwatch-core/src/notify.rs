//! Price quotes and the notification payload handed to a
//! [`Notifier`](crate::source::Notifier).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Substituted for the price whenever a lookup fails or has no listing.
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// Result of a market price lookup that reached the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceQuote {
  /// Currency-formatted lowest listing price, e.g. `"$1.23"`.
  Lowest(String),
  /// No listing, or the market does not know the key.
  Unavailable,
}

impl PriceQuote {
  /// The display string, falling back to [`PRICE_UNAVAILABLE`].
  pub fn display(&self) -> &str {
    match self {
      Self::Lowest(p) => p,
      Self::Unavailable => PRICE_UNAVAILABLE,
    }
  }
}

/// A push notification, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
  pub title: String,
  pub body:  String,
  /// Free-form structured fields delivered alongside the message.
  pub data:  Map<String, Value>,
}

impl NotificationPayload {
  pub fn data_str(&self, key: &str) -> Option<&str> {
    self.data.get(key).and_then(Value::as_str)
  }
}
