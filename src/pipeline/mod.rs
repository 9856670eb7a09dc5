//! Pipeline entry points for the restock monitor.
//!
//! - `run_monitor`: Search every keyword, detect restocks, notify, save
//! - `run_validate`: Check a configuration file
//! - `run_info`: Summarize the persisted state

pub mod detect;
pub mod info;
pub mod run;
pub mod validate;

pub use detect::{apply_items, is_restock};
pub use info::{KeywordSummary, run_info, summarize};
pub use run::run_monitor;
pub use validate::run_validate;
