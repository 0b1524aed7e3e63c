//! Steam market price lookup.
//!
//! `GET <community>/market/priceoverview/?appid=730&currency=<n>&market_hash_name=<key>`

use dropwatch_core::{notify::PriceQuote, source::PriceSource};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{Error, Result, client::join_url};

/// Looks up lowest listing prices on the Steam community market.
#[derive(Clone)]
pub struct SteamMarketClient {
  client:        Client,
  community_url: String,
  /// Steam currency code; 1 is USD.
  currency:      u32,
}

impl SteamMarketClient {
  pub fn new(
    client: Client,
    community_url: impl Into<String>,
    currency: u32,
  ) -> Self {
    Self { client, community_url: community_url.into(), currency }
  }
}

impl PriceSource for SteamMarketClient {
  type Error = Error;

  async fn lowest_price(&self, market_key: &str) -> Result<PriceQuote> {
    let url = join_url(&self.community_url, "market/priceoverview/");
    let resp = self
      .client
      .get(&url)
      .query(&[
        ("appid", "730".to_string()),
        ("currency", self.currency.to_string()),
        ("market_hash_name", market_key.to_string()),
      ])
      .send()
      .await?;

    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
      return Err(Error::Status { url, status });
    }

    // Steam answers unknown items with a 500 and `{"success":false}`, which is
    // a normal "unavailable", not a failure.
    let body = resp.bytes().await?;
    match parse_price(&body) {
      Ok(quote) => Ok(quote),
      Err(_) if !status.is_success() => Err(Error::Status { url, status }),
      Err(e) => Err(e),
    }
  }
}

#[derive(Debug, Deserialize)]
struct RawPriceOverview {
  #[serde(default)]
  success:      bool,
  lowest_price: Option<String>,
}

/// Decode a `priceoverview` response body.
pub fn parse_price(body: &[u8]) -> Result<PriceQuote> {
  let raw: RawPriceOverview = serde_json::from_slice(body)?;
  Ok(match raw.lowest_price {
    Some(p) if raw.success && !p.trim().is_empty() => PriceQuote::Lowest(p),
    _ => PriceQuote::Unavailable,
  })
}
