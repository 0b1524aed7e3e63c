//! Steam community inventory fetcher.
//!
//! `GET <community>/inventory/<steamid>/730/2?l=english&count=<cap>`

use dropwatch_core::{
  FetchError,
  account::AccountId,
  item::{AssetRecord, InventoryPage, ItemDescriptor},
  source::InventorySource,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::client::join_url;

/// CS2 app id and item context on Steam.
const APP_ID: u32 = 730;
const CONTEXT_ID: u32 = 2;

/// Fetches CS2 inventories from the public Steam community endpoint.
#[derive(Clone)]
pub struct SteamInventoryClient {
  client:        Client,
  community_url: String,
}

impl SteamInventoryClient {
  pub fn new(client: Client, community_url: impl Into<String>) -> Self {
    Self { client, community_url: community_url.into() }
  }

  fn url(&self, account: &AccountId) -> String {
    join_url(
      &self.community_url,
      &format!("inventory/{account}/{APP_ID}/{CONTEXT_ID}"),
    )
  }
}

impl InventorySource for SteamInventoryClient {
  async fn fetch(
    &self,
    account: &AccountId,
    item_cap: u32,
  ) -> Result<InventoryPage, FetchError> {
    let url = self.url(account);
    let resp = self
      .client
      .get(&url)
      .query(&[("l", "english".to_string()), ("count", item_cap.to_string())])
      .send()
      .await
      .map_err(classify_transport_error)?;

    let status = resp.status();
    if let Some(err) = classify_status(status) {
      tracing::debug!(%account, %status, "inventory request rejected");
      return Err(err);
    }

    let body = resp.bytes().await.map_err(classify_transport_error)?;
    parse_inventory(&body)
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawInventory {
  #[serde(default)]
  assets:                Vec<RawAsset>,
  #[serde(default)]
  descriptions:          Vec<RawDescription>,
  total_inventory_count: Option<u64>,
  success:               Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
  assetid:    String,
  classid:    String,
  instanceid: String,
}

#[derive(Debug, Deserialize)]
struct RawDescription {
  classid:          String,
  instanceid:       String,
  #[serde(default)]
  name:             String,
  #[serde(default)]
  market_hash_name: String,
  #[serde(default)]
  descriptions:     Vec<RawDescriptionLine>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptionLine {
  #[serde(default)]
  value: String,
}

/// Map a non-success HTTP status onto the fetch-error taxonomy.
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
  match status {
    s if s.is_success() => None,
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(FetchError::Private),
    s => Some(FetchError::Transient(format!("HTTP {s}"))),
  }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
  if e.is_timeout() {
    FetchError::Timeout
  } else if e.is_decode() {
    FetchError::Malformed(e.to_string())
  } else {
    FetchError::Transient(e.to_string())
  }
}

fn is_truthy(v: &Value) -> bool {
  match v {
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_u64() == Some(1),
    _ => false,
  }
}

/// Decode a Steam inventory response body.
///
/// A body of `null` is what Steam sends for private profiles. A missing
/// `assets` key with a truthy `success` is a valid empty inventory.
pub fn parse_inventory(body: &[u8]) -> Result<InventoryPage, FetchError> {
  let value: Value = serde_json::from_slice(body)
    .map_err(|e| FetchError::Malformed(e.to_string()))?;
  if value.is_null() {
    return Err(FetchError::Private);
  }

  let raw: RawInventory = serde_json::from_value(value)
    .map_err(|e| FetchError::Malformed(e.to_string()))?;
  if !raw.success.as_ref().is_some_and(is_truthy) {
    return Err(FetchError::Malformed("success flag not set".into()));
  }

  Ok(InventoryPage {
    assets:       raw
      .assets
      .into_iter()
      .map(|a| AssetRecord {
        asset_id:    a.assetid,
        class_id:    a.classid,
        instance_id: a.instanceid,
      })
      .collect(),
    descriptions: raw
      .descriptions
      .into_iter()
      .map(|d| ItemDescriptor {
        class_id:          d.classid,
        instance_id:       d.instanceid,
        name:              d.name,
        market_hash_name:  d.market_hash_name,
        description_lines: d
          .descriptions
          .into_iter()
          .map(|l| l.value)
          .filter(|v| !v.trim().is_empty())
          .collect(),
      })
      .collect(),
    total_count:  raw.total_inventory_count,
  })
}

#[cfg(test)]
mod tests {
  use dropwatch_core::item::ItemId;

  use super::*;

  const SAMPLE: &str = r#"{
    "assets": [
      {"appid":730,"contextid":"2","assetid":"3001","classid":"77","instanceid":"0","amount":"1"},
      {"appid":730,"contextid":"2","assetid":"3002","classid":"88","instanceid":"0","amount":"1"}
    ],
    "descriptions": [
      {"appid":730,"classid":"77","instanceid":"0",
       "name":"ESL One Katowice 2019 Dust II Souvenir Package",
       "market_hash_name":"ESL One Katowice 2019 Dust II Souvenir Package",
       "descriptions":[
         {"type":"html","value":" "},
         {"type":"html","value":"It was dropped during the Grand Final match between Astralis and ENCE, in which Astralis won."}
       ]},
      {"appid":730,"classid":"88","instanceid":"0",
       "name":"AK-47 | Redline","market_hash_name":"AK-47 | Redline (Field-Tested)"}
    ],
    "total_inventory_count": 2,
    "success": 1,
    "rwgrsn": -2
  }"#;

  #[test]
  fn parses_assets_and_descriptions() {
    let page = parse_inventory(SAMPLE.as_bytes()).unwrap();
    assert_eq!(page.assets.len(), 2);
    assert_eq!(page.descriptions.len(), 2);
    assert_eq!(page.total_count, Some(2));

    let items = page.observed_items();
    assert_eq!(items[0].item_id, ItemId::from("3001"));
    assert_eq!(items[0].description_text.len(), 1, "blank lines are dropped");
    assert_eq!(items[1].market_key, "AK-47 | Redline (Field-Tested)");
  }

  #[test]
  fn empty_inventory_is_valid() {
    let page =
      parse_inventory(br#"{"total_inventory_count":0,"success":1}"#).unwrap();
    assert!(page.assets.is_empty());
    assert!(page.observed_items().is_empty());
  }

  #[test]
  fn null_body_means_private() {
    assert_eq!(parse_inventory(b"null"), Err(FetchError::Private));
  }

  #[test]
  fn success_false_is_malformed() {
    assert!(matches!(
      parse_inventory(br#"{"success":false}"#),
      Err(FetchError::Malformed(_))
    ));
  }

  #[test]
  fn garbage_is_malformed() {
    assert!(matches!(
      parse_inventory(b"<html>rate limited</html>"),
      Err(FetchError::Malformed(_))
    ));
  }

  #[test]
  fn status_classification() {
    assert_eq!(classify_status(StatusCode::OK), None);
    assert_eq!(classify_status(StatusCode::FORBIDDEN), Some(FetchError::Private));
    assert!(matches!(
      classify_status(StatusCode::TOO_MANY_REQUESTS),
      Some(FetchError::Transient(_))
    ));
    assert!(matches!(
      classify_status(StatusCode::BAD_GATEWAY),
      Some(FetchError::Transient(_))
    ));
  }
}
