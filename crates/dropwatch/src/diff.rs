//! Reconciliation: this poll's classified drops → what is new.
//!
//! Computes, for one account, the item-id set to store and the drops that
//! warrant a notification, given the ids stored after the previous poll.

use std::collections::{BTreeSet, HashMap};

use dropwatch_core::item::{ClassifiedDrop, ItemId};

/// The result of reconciling one account's poll against its stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
  /// Every classified drop of this poll, one per item id, in first-seen
  /// order.
  pub current:        Vec<ClassifiedDrop>,
  /// Drops whose id was absent from the previous snapshot. Always empty for
  /// a new account.
  pub new_drops:      Vec<ClassifiedDrop>,
  /// The account had no stored entry (baseline capture).
  pub is_new_account: bool,
}

impl Reconciliation {
  /// The id set that replaces the account's stored entry.
  pub fn current_ids(&self) -> BTreeSet<ItemId> {
    self.current.iter().map(|d| d.item_id.clone()).collect()
  }
}

/// Reconcile `drops` (in fetch order) against `prior`.
///
/// When the same item id appears more than once, the later classification
/// wins but the id keeps its first position. When `prior` is `None` the
/// account is new and nothing is reported as new, however many drops exist.
pub fn reconcile(
  prior: Option<&BTreeSet<ItemId>>,
  drops: Vec<ClassifiedDrop>,
) -> Reconciliation {
  let mut order: Vec<ItemId> = Vec::with_capacity(drops.len());
  let mut latest: HashMap<ItemId, ClassifiedDrop> = HashMap::new();
  for classified in drops {
    if !latest.contains_key(&classified.item_id) {
      order.push(classified.item_id.clone());
    }
    latest.insert(classified.item_id.clone(), classified);
  }

  let current: Vec<ClassifiedDrop> = order
    .iter()
    .filter_map(|id| latest.remove(id))
    .collect();

  let Some(prior) = prior else {
    return Reconciliation {
      current,
      new_drops: vec![],
      is_new_account: true,
    };
  };

  let new_drops = current
    .iter()
    .filter(|d| !prior.contains(&d.item_id))
    .cloned()
    .collect();

  Reconciliation {
    current,
    new_drops,
    is_new_account: false,
  }
}
