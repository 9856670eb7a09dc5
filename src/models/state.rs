//! Persisted monitoring state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemSnapshot;

/// Snapshots for one configured keyword, keyed by item code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordState {
    #[serde(default)]
    pub items: BTreeMap<String, ItemSnapshot>,
}

impl KeywordState {
    pub fn get(&self, item_code: &str) -> Option<&ItemSnapshot> {
        self.items.get(item_code)
    }

    pub fn in_stock_count(&self) -> usize {
        self.items
            .values()
            .filter(|s| s.availability.is_in_stock())
            .count()
    }
}

/// Top-level state file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default)]
    pub keywords: BTreeMap<String, KeywordState>,

    /// Completion time of the previous run; `None` before the first one
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

impl MonitorState {
    /// Mutable state for a keyword, created on first use.
    pub fn keyword_mut(&mut self, keyword: &str) -> &mut KeywordState {
        self.keywords.entry(keyword.to_string()).or_default()
    }

    pub fn keyword(&self, keyword: &str) -> Option<&KeywordState> {
        self.keywords.get(keyword)
    }

    /// Total number of tracked item snapshots.
    pub fn item_count(&self) -> usize {
        self.keywords.values().map(|k| k.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    #[test]
    fn test_empty_state_shape() {
        let json = serde_json::to_value(MonitorState::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "keywords": {}, "last_run": null }));
    }

    #[test]
    fn test_parse_state_file() {
        let json = r#"{
          "keywords": {
            "ポケモンカード": {
              "items": {
                "shop:A001": {
                  "item_name": "Booster box",
                  "item_url": "https://item.rakuten.co.jp/shop/a001/",
                  "item_price": 5400,
                  "shop_name": "Shop",
                  "availability": 0,
                  "last_seen": "2026-01-01T00:15:00+00:00",
                  "last_changed": "2026-01-01T00:00:00+00:00"
                }
              }
            }
          },
          "last_run": "2026-01-01T00:15:00+00:00"
        }"#;

        let state: MonitorState = serde_json::from_str(json).unwrap();
        let kw = state.keyword("ポケモンカード").unwrap();
        assert_eq!(
            kw.get("shop:A001").unwrap().availability,
            Availability::OutOfStock
        );
        assert_eq!(kw.in_stock_count(), 0);
        assert_eq!(state.item_count(), 1);
        assert!(state.last_run.is_some());
    }
}
