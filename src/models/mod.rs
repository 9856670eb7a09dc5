// src/models/mod.rs

//! Domain models for the restock monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod credentials;
mod item;
mod report;
mod state;
mod transition;

// Re-export all public types
pub use config::{
    Config, KeywordConfig, MAX_HITS, MonitorConfig, NotifyConfig, PROVIDER_MESSAGE_LIMIT,
    SearchConfig,
};
pub use credentials::{
    Credentials, ENV_ACCESS_KEY, ENV_APP_ID, ENV_LINE_TOKEN, ENV_LINE_USER, NotifyCredentials,
    SearchCredentials,
};
pub use item::{Availability, ItemRecord, ItemSnapshot};
pub use report::RunReport;
pub use state::{KeywordState, MonitorState};
pub use transition::Transition;
