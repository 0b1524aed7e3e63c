//! Notification payload construction for a newly observed drop.

use dropwatch_core::{
  account::{Account, AccountId},
  item::{ClassifiedDrop, ItemId},
  notify::NotificationPayload,
};
use serde_json::{Map, Value};

/// Deep link to the item in the owner's Steam inventory.
pub fn inventory_url(account: &AccountId, item: &ItemId) -> String {
  format!("https://steamcommunity.com/profiles/{account}/inventory/#730_2_{item}")
}

/// Build the push payload for `drop` on `account`, priced at `price`.
///
/// Tier and team fields are present only when the drop carries match
/// context.
pub fn build_payload(
  account: &Account,
  drop: &ClassifiedDrop,
  price: &str,
) -> NotificationPayload {
  let package = format!(
    "{} {} {} Souvenir Package",
    drop.event, drop.year, drop.location
  );
  let mut body = format!("{package} ({price})");
  if let Some(ctx) = &drop.match_context {
    body.push_str(&format!("\n{}: {} vs {}", ctx.tier, ctx.team1, ctx.team2));
  }

  let url = inventory_url(&account.account_id, &drop.item_id);
  let mut data = Map::new();
  data.insert("account_id".into(), Value::from(account.account_id.as_str()));
  data.insert("display_name".into(), Value::from(account.display_name.as_str()));
  data.insert("item_id".into(), Value::from(drop.item_id.as_str()));
  data.insert("price".into(), Value::from(price));
  data.insert("event".into(), Value::from(drop.event.as_str()));
  data.insert("year".into(), Value::from(drop.year));
  data.insert("location".into(), Value::from(drop.location.as_str()));
  data.insert("url".into(), Value::from(url));
  if let Some(ctx) = &drop.match_context {
    data.insert("tier".into(), Value::from(ctx.tier.as_str()));
    data.insert("team1".into(), Value::from(ctx.team1.as_str()));
    data.insert("team2".into(), Value::from(ctx.team2.as_str()));
  }

  NotificationPayload {
    title: format!("New souvenir drop for {}", account.display_name),
    body,
    data,
  }
}
