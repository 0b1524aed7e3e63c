//! Inventory items: what an upstream poll returns and what the classifier
//! derives from it.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque identifier of one owned item, unique within an inventory snapshot.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ItemId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Raw inventory page ──────────────────────────────────────────────────────

/// A concrete owned item. Many assets may share one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
  pub asset_id:    String,
  pub class_id:    String,
  pub instance_id: String,
}

/// The shared description of every asset with the same
/// `(class_id, instance_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
  pub class_id:          String,
  pub instance_id:       String,
  pub name:              String,
  pub market_hash_name:  String,
  /// Free-text description lines, in upstream order.
  pub description_lines: Vec<String>,
}

/// One parsed inventory response: owned assets plus their descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPage {
  pub assets:       Vec<AssetRecord>,
  pub descriptions: Vec<ItemDescriptor>,
  /// Total item count as reported upstream; informational only.
  pub total_count:  Option<u64>,
}

impl InventoryPage {
  /// Join every asset to its descriptor.
  ///
  /// The resulting [`ObservedItem::item_id`] is the asset id. Assets whose
  /// `(class_id, instance_id)` pair has no descriptor are dropped. When two
  /// descriptors share a pair, the later one wins. Output order follows the
  /// asset list.
  pub fn observed_items(&self) -> Vec<ObservedItem> {
    let by_pair: HashMap<(&str, &str), &ItemDescriptor> = self
      .descriptions
      .iter()
      .map(|d| ((d.class_id.as_str(), d.instance_id.as_str()), d))
      .collect();

    self
      .assets
      .iter()
      .filter_map(|asset| {
        let desc = by_pair
          .get(&(asset.class_id.as_str(), asset.instance_id.as_str()))?;
        Some(ObservedItem {
          item_id:          ItemId::new(asset.asset_id.clone()),
          display_name:     desc.name.clone(),
          market_key:       desc.market_hash_name.clone(),
          description_text: desc.description_lines.clone(),
        })
      })
      .collect()
  }
}

// ─── Observed / classified ───────────────────────────────────────────────────

/// One inventory entry returned by a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedItem {
  pub item_id:          ItemId,
  pub display_name:     String,
  /// Key used for the market price lookup.
  pub market_key:       String,
  /// Auxiliary descriptive lines, scanned for match context.
  pub description_text: Vec<String>,
}

/// Tournament match a souvenir package was dropped during.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
  pub tier:  String,
  pub team1: String,
  pub team2: String,
}

/// A souvenir package drop recognised by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDrop {
  pub item_id:       ItemId,
  pub event:         String,
  pub year:          u16,
  pub location:      String,
  pub market_key:    String,
  pub match_context: Option<MatchContext>,
}
