//! Service layer for the restock monitor.
//!
//! This module contains the outbound integrations:
//! - Product search with throttling and retries (`SearchClient`)
//! - Push alerts with message batching (`Notifier`)

mod notifier;
mod search;
mod throttle;

pub use notifier::{LinePushTransport, Notifier, PushTransport};
pub use search::{
    AvailabilityFilter, FetchError, HttpSearchBackend, RetryPolicy, SearchBackend, SearchClient,
    SearchQuery, parse_items,
};
pub use throttle::RateLimiter;
