// src/pipeline/info.rs

use crate::error::Result;
use crate::models::MonitorState;
use crate::storage::LocalStateStore;

/// One line of the state summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSummary {
    pub keyword: String,
    pub items: usize,
    pub in_stock: usize,
}

/// Per-keyword counts, in keyword order.
pub fn summarize(state: &MonitorState) -> Vec<KeywordSummary> {
    state
        .keywords
        .iter()
        .map(|(keyword, entry)| KeywordSummary {
            keyword: keyword.clone(),
            items: entry.items.len(),
            in_stock: entry.in_stock_count(),
        })
        .collect()
}

/// Print the persisted state summary.
///
/// A corrupt state file is reported as an error rather than treated as empty.
pub async fn run_info(store: &LocalStateStore) -> Result<Option<MonitorState>> {
    log::info!("State file: {}", store.path().display());

    let Some(state) = store.read_state().await? else {
        log::info!("No state recorded yet.");
        return Ok(None);
    };

    match state.last_run {
        Some(at) => log::info!("Last run: {}", at.to_rfc3339()),
        None => log::info!("Last run: never"),
    }
    log::info!(
        "Tracking {} item(s) across {} keyword(s)",
        state.item_count(),
        state.keywords.len()
    );
    for line in summarize(&state) {
        log::info!(
            "    {}: {} item(s), {} in stock",
            line.keyword,
            line.items,
            line.in_stock
        );
    }

    Ok(Some(state))
}
