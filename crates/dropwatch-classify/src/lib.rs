//! Souvenir package classifier for dropwatch.
//!
//! Turns an [`ObservedItem`] into a [`ClassifiedDrop`] when its display name
//! is a souvenir package. Pure synchronous; no HTTP or storage dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use dropwatch_classify::parse_package_name;
//!
//! let name = parse_package_name("ESL One Katowice 2019 Dust II Souvenir Package").unwrap();
//! assert_eq!(name.year, 2019);
//! ```

mod parse;

use dropwatch_core::item::{ClassifiedDrop, ObservedItem};

pub use parse::{PackageName, parse_match_context, parse_package_name};

/// Classify one inventory item.
///
/// Returns `None` for anything that is not a souvenir package; such items are
/// invisible to reconciliation. Match context is attached when any
/// description line carries it and is otherwise left unset.
pub fn classify(item: &ObservedItem) -> Option<ClassifiedDrop> {
  let name = parse_package_name(&item.display_name)?;
  Some(ClassifiedDrop {
    item_id:       item.item_id.clone(),
    event:         name.event,
    year:          name.year,
    location:      name.location,
    market_key:    item.market_key.clone(),
    match_context: parse_match_context(&item.description_text),
  })
}

/// Classify every item in fetch order, dropping non-matches.
pub fn classify_all(items: &[ObservedItem]) -> Vec<ClassifiedDrop> {
  items.iter().filter_map(classify).collect()
}
