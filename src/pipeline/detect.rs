//! Restock detection.
//!
//! Compares freshly fetched items against the snapshots recorded for a
//! keyword, emits a [`Transition`] for every out-of-stock → in-stock flip,
//! and overwrites the snapshots with the fetched data.

use chrono::{DateTime, Utc};

use crate::models::{Availability, ItemRecord, ItemSnapshot, KeywordState, Transition};

/// Whether a change from `previous` to `current` is worth an alert.
///
/// Only a known out-of-stock state counts as "previous"; an item seen for the
/// first time (`None`) never fires, whatever its current availability.
pub fn is_restock(previous: Option<Availability>, current: Availability) -> bool {
    previous == Some(Availability::OutOfStock) && current == Availability::InStock
}

/// Apply one keyword's search results to its state.
///
/// Each item is compared with the latest snapshot for its code, including one
/// written earlier in the same call. Snapshots are always replaced.
pub fn apply_items(
    keyword: &str,
    state: &mut KeywordState,
    items: &[ItemRecord],
    now: DateTime<Utc>,
) -> Vec<Transition> {
    let mut transitions = Vec::new();

    for item in items {
        let previous = state.get(&item.item_code);
        let restocked = is_restock(previous.map(|p| p.availability), item.availability);
        let snapshot = ItemSnapshot::observe(item, previous, now);

        if restocked {
            transitions.push(Transition::from_record(keyword, item));
        }
        state.items.insert(item.item_code.clone(), snapshot);
    }

    transitions
}
