// src/pipeline/run.rs

//! One monitoring run over all configured keywords.

use crate::error::Result;
use crate::models::{Config, RunReport};
use crate::services::{Notifier, SearchClient, SearchQuery};
use crate::storage::StateStore;
use crate::utils::clock::Clock;
use crate::utils::logging;

use super::detect::apply_items;

/// Run the restock monitor once.
///
/// Keywords are searched in configured order with `api_delay_secs` between
/// them. A failed search skips only that keyword. Alerts go out in a single
/// notification pass, then the state is saved exactly once.
pub async fn run_monitor(
    config: &Config,
    search: &mut SearchClient,
    notifier: &Notifier,
    store: &dyn StateStore,
    clock: &dyn Clock,
) -> Result<RunReport> {
    let mut report = RunReport::new(clock.utc_now());
    logging::header("Restock monitor starting");

    let mut state = store.load().await;
    let delay = config.monitor.api_delay();

    for entry in &config.keywords {
        report.keyword_total += 1;
        log::info!("[search] Keyword: {}", entry.keyword);

        let query = SearchQuery::for_keyword(entry, config.search.hits);
        match search.search_with_retry(&query).await {
            Ok(items) => {
                log::info!("[search]   → {} item(s) fetched", items.len());

                let keyword_state = state.keyword_mut(&entry.keyword);
                let found = apply_items(&entry.keyword, keyword_state, &items, clock.utc_now());
                for transition in &found {
                    log::info!("[run]   ✅ Back in stock: {}", transition.item_name);
                }

                report.items_processed += items.len();
                report.transitions.extend(found);
            }
            Err(e) => {
                report.keyword_failures += 1;
                log::error!("[search] {} skipped: {}", entry.keyword, e);
            }
        }

        clock.sleep(delay).await;
    }

    if report.transitions.is_empty() {
        log::info!("[run] No restocks detected");
    } else {
        report.messages_sent = notifier.send_stock_alerts(&report.transitions).await;
    }

    state.last_run = Some(clock.utc_now());
    store.save(&state).await?;

    report.end_time = clock.utc_now();
    logging::summary(
        "Run complete",
        &[
            (
                "Keywords",
                format!(
                    "{} searched, {} failed",
                    report.keyword_total, report.keyword_failures
                ),
            ),
            (
                "Success rate",
                format!("{:.1}%", report.success_rate() * 100.0),
            ),
            ("Items", report.items_processed.to_string()),
            ("Restocks", report.transitions.len().to_string()),
            ("Messages sent", report.messages_sent.to_string()),
            (
                "Duration",
                format!("{}s", (report.end_time - report.start_time).num_seconds()),
            ),
        ],
    );

    Ok(report)
}
