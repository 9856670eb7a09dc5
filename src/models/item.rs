//! Item records returned by the search API and their persisted snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock state reported by the search provider.
///
/// Encoded as `1` (in stock) / `0` (out of stock) both on the wire and on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Availability {
    OutOfStock,
    InStock,
}

impl Availability {
    pub fn is_in_stock(self) -> bool {
        self == Availability::InStock
    }
}

impl TryFrom<u8> for Availability {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Availability::OutOfStock),
            1 => Ok(Availability::InStock),
            other => Err(format!("availability must be 0 or 1, got {other}")),
        }
    }
}

impl From<Availability> for u8 {
    fn from(value: Availability) -> Self {
        match value {
            Availability::OutOfStock => 0,
            Availability::InStock => 1,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::OutOfStock => f.write_str("out of stock"),
            Availability::InStock => f.write_str("in stock"),
        }
    }
}

/// One validated item from a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Stable external identifier (`shop:item`)
    pub item_code: String,

    pub item_name: String,

    /// Price in whole currency units
    pub item_price: i64,

    pub item_url: String,

    pub shop_name: String,

    pub availability: Availability,
}

/// Last-known state of one item code under one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_name: String,
    pub item_url: String,
    pub item_price: i64,
    pub shop_name: String,
    pub availability: Availability,

    /// When the item was last returned by a search
    pub last_seen: DateTime<Utc>,

    /// When the availability last flipped (or the item was first seen)
    pub last_changed: DateTime<Utc>,
}

impl ItemSnapshot {
    /// Build the snapshot that replaces `previous` after seeing `record` at `now`.
    ///
    /// `last_changed` moves to `now` only when availability differs from the
    /// previous snapshot, or there was none.
    pub fn observe(
        record: &ItemRecord,
        previous: Option<&ItemSnapshot>,
        now: DateTime<Utc>,
    ) -> Self {
        let last_changed = match previous {
            Some(prev) if prev.availability == record.availability => prev.last_changed,
            _ => now,
        };

        Self {
            item_name: record.item_name.clone(),
            item_url: record.item_url.clone(),
            item_price: record.item_price,
            shop_name: record.shop_name.clone(),
            availability: record.availability,
            last_seen: now,
            last_changed,
        }
    }
}
