//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Run pacing and state location
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Search API client settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Push notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Keywords to watch, processed in this order
    #[serde(default)]
    pub keywords: Vec<KeywordConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "[config] Load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let delay = self.monitor.api_delay_secs;
        if !delay.is_finite() || !(0.0..=MAX_API_DELAY_SECS).contains(&delay) {
            return Err(AppError::validation(format!(
                "monitor.api_delay_secs must be between 0 and {MAX_API_DELAY_SECS}"
            )));
        }
        if self.monitor.state_file.as_os_str().is_empty() {
            return Err(AppError::validation("monitor.state_file is empty"));
        }

        url::Url::parse(&self.search.endpoint)?;
        if self.search.timeout_secs == 0 {
            return Err(AppError::validation("search.timeout_secs must be > 0"));
        }
        if !(1..=MAX_HITS).contains(&self.search.hits) {
            return Err(AppError::validation(format!(
                "search.hits must be between 1 and {MAX_HITS}"
            )));
        }
        if self.search.max_retries == 0 {
            return Err(AppError::validation("search.max_retries must be > 0"));
        }

        url::Url::parse(&self.notify.endpoint)?;
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        if self.notify.max_message_chars == 0
            || self.notify.max_message_chars > PROVIDER_MESSAGE_LIMIT
        {
            return Err(AppError::validation(format!(
                "notify.max_message_chars must be between 1 and {PROVIDER_MESSAGE_LIMIT}"
            )));
        }

        if self.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        let mut seen = HashSet::new();
        for entry in &self.keywords {
            let keyword = entry.keyword.trim();
            if keyword.is_empty() {
                return Err(AppError::validation("Keyword entry with empty keyword"));
            }
            if !seen.insert(keyword) {
                return Err(AppError::validation(format!(
                    "Duplicate keyword '{keyword}'"
                )));
            }
            if let (Some(min), Some(max)) = (entry.min_price, entry.max_price) {
                if min > max {
                    return Err(AppError::validation(format!(
                        "Keyword '{keyword}': min_price {min} exceeds max_price {max}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Largest page size the search API accepts.
pub const MAX_HITS: u32 = 30;

/// Longest accepted pause between keywords, in seconds.
pub const MAX_API_DELAY_SECS: f64 = 3600.0;

/// Hard per-message limit of the push provider.
pub const PROVIDER_MESSAGE_LIMIT: usize = 5000;

/// Run pacing and persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause after each keyword, in seconds
    #[serde(default = "defaults::api_delay")]
    pub api_delay_secs: f64,

    /// Location of the persisted state file
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
}

impl MonitorConfig {
    /// Pause after each keyword. Out-of-range values fall back to the default.
    pub fn api_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.api_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(defaults::api_delay()))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_delay_secs: defaults::api_delay(),
            state_file: defaults::state_file(),
        }
    }
}

/// Search API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Item search endpoint
    #[serde(default = "defaults::search_endpoint")]
    pub endpoint: String,

    /// Origin header sent with every request
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Results per page (max 30)
    #[serde(default = "defaults::hits")]
    pub hits: u32,

    /// Attempts per keyword before giving up
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Minimum spacing between requests in milliseconds
    #[serde(default = "defaults::min_request_interval")]
    pub min_request_interval_ms: u64,
}

impl SearchConfig {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::search_endpoint(),
            origin: defaults::origin(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            hits: defaults::hits(),
            max_retries: defaults::max_retries(),
            min_request_interval_ms: defaults::min_request_interval(),
        }
    }
}

/// Push notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Push message endpoint
    #[serde(default = "defaults::notify_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Ceiling for a single message, kept under the provider limit
    #[serde(default = "defaults::max_message_chars")]
    pub max_message_chars: usize,

    /// First line of every alert
    #[serde(default = "defaults::header")]
    pub header: String,

    /// Appended to formatted prices
    #[serde(default = "defaults::currency_suffix")]
    pub currency_suffix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::notify_endpoint(),
            timeout_secs: defaults::timeout(),
            max_message_chars: defaults::max_message_chars(),
            header: defaults::header(),
            currency_suffix: defaults::currency_suffix(),
        }
    }
}

/// One watched search term with optional price bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub keyword: String,

    #[serde(default)]
    pub min_price: Option<u64>,

    #[serde(default)]
    pub max_price: Option<u64>,
}

impl KeywordConfig {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            min_price: None,
            max_price: None,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Monitor defaults
    pub fn api_delay() -> f64 {
        1.5
    }
    pub fn state_file() -> PathBuf {
        PathBuf::from("data/state.json")
    }

    // Search defaults
    pub fn search_endpoint() -> String {
        "https://openapi.rakuten.co.jp/ichibams/api/IchibaItem/Search/20220601".into()
    }
    pub fn origin() -> String {
        "https://github.com".into()
    }
    pub fn user_agent() -> String {
        concat!("restock/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn hits() -> u32 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn min_request_interval() -> u64 {
        1000
    }

    // Notify defaults
    pub fn notify_endpoint() -> String {
        "https://api.line.me/v2/bot/message/push".into()
    }
    pub fn max_message_chars() -> usize {
        4900
    }
    pub fn header() -> String {
        "🔔 在庫復活アラート 🔔".into()
    }
    pub fn currency_suffix() -> String {
        "円".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            keywords: vec![KeywordConfig::new("widget")],
            ..Config::default()
        }
    }

    #[test]
    fn validate_sample_config_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_keywords() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_price_bounds() {
        let mut config = sample_config();
        config.keywords[0].min_price = Some(5000);
        config.keywords[0].max_price = Some(1000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_keywords() {
        let mut config = sample_config();
        config.keywords.push(KeywordConfig::new(" widget "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_delay() {
        for delay in [-1.0, f64::NAN, 1e20] {
            let mut config = sample_config();
            config.monitor.api_delay_secs = delay;
            assert!(matches!(config.validate(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn api_delay_never_panics_on_huge_values() {
        let monitor = MonitorConfig {
            api_delay_secs: 1e20,
            ..MonitorConfig::default()
        };
        assert_eq!(monitor.api_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn validate_rejects_page_size_over_limit() {
        let mut config = sample_config();
        config.search.hits = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_message_ceiling_over_provider_limit() {
        let mut config = sample_config();
        config.notify.max_message_chars = 5001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let mut config = sample_config();
        config.search.endpoint = "not a url".into();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn parse_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [monitor]
            api_delay_secs = 2.0

            [[keywords]]
            keyword = "ポケモンカード 151"
            max_price = 8000

            [[keywords]]
            keyword = "switch"
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.api_delay(), Duration::from_secs(2));
        assert_eq!(config.search.hits, 30);
        assert_eq!(config.search.max_retries, 3);
        assert_eq!(config.notify.max_message_chars, 4900);
        assert_eq!(config.keywords.len(), 2);
        assert_eq!(config.keywords[0].max_price, Some(8000));
        assert_eq!(config.keywords[1].min_price, None);
        assert!(config.validate().is_ok());
    }
}
