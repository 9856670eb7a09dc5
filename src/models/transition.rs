//! Detected restock events.

use serde::{Deserialize, Serialize};

use super::ItemRecord;

/// One out-of-stock → in-stock flip detected during the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub keyword: String,
    pub item_name: String,
    pub item_price: i64,
    pub shop_name: String,
    pub item_url: String,
}

impl Transition {
    pub fn from_record(keyword: &str, record: &ItemRecord) -> Self {
        Self {
            keyword: keyword.to_string(),
            item_name: record.item_name.clone(),
            item_price: record.item_price,
            shop_name: record.shop_name.clone(),
            item_url: record.item_url.clone(),
        }
    }
}
