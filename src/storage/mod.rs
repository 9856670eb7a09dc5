//! Persistence for monitoring state.
//!
//! State lives in a single pretty-printed JSON file with a sibling backup:
//!
//! ```text
//! data/
//! ├── state.json        # keyword → item code → snapshot, plus last_run
//! └── state.json.bak    # previous state, refreshed before every save
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::MonitorState;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the previous state. Never fails: a missing or unreadable store
    /// yields an empty state.
    async fn load(&self) -> MonitorState;

    /// Persist `state`, leaving the previous state intact when the write fails.
    async fn save(&self, state: &MonitorState) -> Result<()>;
}
