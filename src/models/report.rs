//! Summary of one monitoring run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Transition;

/// Outcome of a single pass over all configured keywords.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub keyword_total: usize,
    pub keyword_failures: usize,
    pub items_processed: usize,
    pub transitions: Vec<Transition>,
    pub messages_sent: usize,
}

impl RunReport {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: start_time,
            keyword_total: 0,
            keyword_failures: 0,
            items_processed: 0,
            transitions: Vec::new(),
            messages_sent: 0,
        }
    }

    /// Share of keywords whose search succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.keyword_total == 0 {
            return 1.0;
        }
        (self.keyword_total - self.keyword_failures) as f64 / self.keyword_total as f64
    }
}
