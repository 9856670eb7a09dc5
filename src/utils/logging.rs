// src/utils/logging.rs

//! Server-style log formatting and section helpers.
//!
//! Library code logs through the `log` facade with a `[component]` tag at
//! the start of each message. The CLI installs `env_logger` with
//! [`format_line`] so every line reads `[timestamp] [LEVEL] [tag] message`.

use chrono::Local;
use log::Level;

/// Format a log message with timestamp and level.
pub fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level_label(level), message)
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRACE",
        Level::Debug => "DEBUG",
        Level::Info => "INFO",
        Level::Warn => "WARN",
        Level::Error => "ERROR",
    }
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_shape() {
        let line = format_line(Level::Warn, "[state] missing");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] [WARN] [state] missing"));
        // "[YYYY-mm-dd HH:MM:SS]"
        assert_eq!(line.find(']'), Some(20));
    }
}
