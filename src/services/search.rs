// src/services/search.rs

//! Product search client.
//!
//! [`HttpSearchBackend`] performs one raw call against the Rakuten Ichiba
//! item search API and classifies the outcome into a [`FetchError`] tag.
//! [`SearchClient`] layers the request throttle and the retry discipline on
//! top of any [`SearchBackend`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ORIGIN;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::models::{ItemRecord, KeywordConfig, SearchConfig, SearchCredentials};
use crate::utils::clock::Clock;
use crate::utils::http::create_async_client;
use crate::utils::truncate_chars;

use super::throttle::RateLimiter;

/// Classified failure of a single search call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection could not be established or timed out
    #[error("connection failed: {0}")]
    Transient(String),

    /// Provider answered HTTP 429
    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    /// Provider answered with a 5xx status
    #[error("server error (HTTP {0})")]
    Server(u16),

    /// Provider refused the request (4xx other than 429)
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Response body was not a search result envelope
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request failed for a reason that retrying will not fix
    #[error("request failed: {0}")]
    Request(String),
}

/// Which items the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityFilter {
    /// Everything, including sold-out listings (`availability=0`)
    All,
    /// Only listings currently in stock (`availability=1`)
    InStockOnly,
}

impl AvailabilityFilter {
    fn as_param(self) -> &'static str {
        match self {
            AvailabilityFilter::All => "0",
            AvailabilityFilter::InStockOnly => "1",
        }
    }
}

/// Parameters of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub availability: AvailabilityFilter,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub hits: u32,
    pub page: u32,
}

impl SearchQuery {
    /// First page of all items (sold-out included) for a configured keyword.
    pub fn for_keyword(entry: &KeywordConfig, hits: u32) -> Self {
        Self {
            keyword: entry.keyword.clone(),
            availability: AvailabilityFilter::All,
            min_price: entry.min_price,
            max_price: entry.max_price,
            hits,
            page: 1,
        }
    }

    /// Query string pairs, credentials included.
    pub fn params(&self, credentials: &SearchCredentials) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("applicationId", credentials.application_id.clone()),
            ("accessKey", credentials.access_key.clone()),
            ("keyword", self.keyword.clone()),
            ("availability", self.availability.as_param().to_string()),
            ("hits", self.hits.to_string()),
            ("page", self.page.to_string()),
            ("format", "json".to_string()),
        ];
        if let Some(min) = self.min_price {
            params.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("maxPrice", max.to_string()));
        }
        params
    }
}

/// One raw search call.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn fetch(&self, query: &SearchQuery)
    -> std::result::Result<Vec<ItemRecord>, FetchError>;
}

/// Search backend talking to the HTTP API.
pub struct HttpSearchBackend {
    client: Client,
    endpoint: String,
    origin: String,
    credentials: SearchCredentials,
}

impl HttpSearchBackend {
    pub fn new(config: &SearchConfig, credentials: SearchCredentials) -> Result<Self> {
        Ok(Self {
            client: create_async_client(&config.user_agent, config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            origin: config.origin.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn fetch(
        &self,
        query: &SearchQuery,
    ) -> std::result::Result<Vec<ItemRecord>, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.params(&self.credentials))
            .header(ORIGIN, &self.origin)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if status.is_server_error() {
            return Err(FetchError::Server(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Rejected {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        parse_items(&body)
    }
}

fn classify_transport(error: reqwest::Error) -> FetchError {
    if error.is_timeout() || error.is_connect() || error.is_body() {
        FetchError::Transient(error.to_string())
    } else {
        FetchError::Request(error.to_string())
    }
}

/// Best human-readable reason from an error response body.
fn provider_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error_description", "error", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }
    truncate_chars(body.trim(), 200).to_string()
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Items", default)]
    items: Vec<Value>,
}

/// Validate a response body into item records.
///
/// Entries that do not carry the required fields are logged and skipped.
pub fn parse_items(body: &str) -> std::result::Result<Vec<ItemRecord>, FetchError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut records = Vec::with_capacity(envelope.items.len());
    for (index, wrapper) in envelope.items.into_iter().enumerate() {
        let raw = match wrapper {
            Value::Object(mut map) => match map.remove("Item") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };

        match serde_json::from_value::<ItemRecord>(raw) {
            Ok(record) if record.item_code.trim().is_empty() => {
                log::warn!("[search] Skipping item #{} with empty itemCode", index);
            }
            Ok(record) => records.push(record),
            Err(e) => log::warn!("[search] Skipping malformed item #{}: {}", index, e),
        }
    }
    Ok(records)
}

/// Backoff schedule for retryable search failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per search
    pub max_retries: u32,
    /// First wait after a connection failure or 5xx; doubles per attempt
    pub base_backoff: Duration,
    /// Wait per attempt number after HTTP 429
    pub rate_limit_step: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// `base × 2^attempt` for a zero-based attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// `step × (attempt + 1)` for a zero-based attempt.
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        self.rate_limit_step.saturating_mul(attempt.saturating_add(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(5),
            rate_limit_step: Duration::from_secs(10),
        }
    }
}

/// Throttled, retrying search client.
pub struct SearchClient {
    backend: Box<dyn SearchBackend>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl SearchClient {
    pub fn new(
        backend: Box<dyn SearchBackend>,
        clock: Arc<dyn Clock>,
        min_interval: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            clock,
            limiter: RateLimiter::new(min_interval),
            policy,
        }
    }

    /// Build a client for the HTTP API from configuration.
    pub fn from_config(
        config: &SearchConfig,
        credentials: SearchCredentials,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let backend = HttpSearchBackend::new(config, credentials)?;
        Ok(Self::new(
            Box::new(backend),
            clock,
            config.min_request_interval(),
            RetryPolicy::new(config.max_retries),
        ))
    }

    /// Single throttled search call.
    pub async fn search(
        &mut self,
        query: &SearchQuery,
    ) -> std::result::Result<Vec<ItemRecord>, FetchError> {
        self.limiter.acquire(self.clock.as_ref()).await;
        self.backend.fetch(query).await
    }

    /// Search with backoff on connection failures, 5xx and 429.
    ///
    /// Every failed attempt counts against `max_retries`; the error after the
    /// last attempt is returned without a further wait.
    pub async fn search_with_retry(&mut self, query: &SearchQuery) -> Result<Vec<ItemRecord>> {
        let max_attempts = self.policy.max_retries.max(1);
        let keyword = query.keyword.as_str();
        let mut attempt = 0;

        loop {
            let error = match self.search(query).await {
                Ok(items) => return Ok(items),
                Err(error) => error,
            };

            let wait = match &error {
                FetchError::Transient(_) | FetchError::Server(_) => {
                    Some(self.policy.backoff(attempt))
                }
                FetchError::RateLimited => Some(self.policy.rate_limit_wait(attempt)),
                FetchError::Rejected { .. } | FetchError::Malformed(_) | FetchError::Request(_) => {
                    None
                }
            };
            let Some(wait) = wait else {
                return Err(AppError::SearchRejected {
                    keyword: keyword.to_string(),
                    cause: error,
                });
            };

            attempt += 1;
            if attempt >= max_attempts {
                log::error!("[retry] {}: retry limit reached ({})", keyword, error);
                return Err(AppError::SearchExhausted {
                    keyword: keyword.to_string(),
                    attempts: attempt,
                    cause: error,
                });
            }

            if error == FetchError::RateLimited {
                log::warn!(
                    "[rate-limit] {}: provider throttled, waiting {}s",
                    keyword,
                    wait.as_secs()
                );
            } else {
                log::warn!(
                    "[retry] {}: attempt {} failed ({}), retrying in {}s",
                    keyword,
                    attempt,
                    error,
                    wait.as_secs()
                );
            }
            self.clock.sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, KeywordConfig};
    use crate::services::testing::{ScriptedBackend, item};
    use crate::utils::clock::ManualClock;

    fn client(backend: &ScriptedBackend, clock: &Arc<ManualClock>) -> SearchClient {
        SearchClient::new(
            Box::new(backend.clone()),
            clock.clone(),
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
    }

    fn query() -> SearchQuery {
        SearchQuery::for_keyword(&KeywordConfig::new("widget"), 30)
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let backend = ScriptedBackend::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Ok(vec![item("A001", Availability::InStock)]),
        ]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        let items = client.search_with_retry(&query()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(backend.calls().len(), 3);
        assert_eq!(clock.sleeps(), secs(&[10, 20]));
    }

    #[tokio::test]
    async fn test_connection_failures_exhaust_budget() {
        let backend = ScriptedBackend::new(vec![
            Err(FetchError::Transient("refused".into())),
            Err(FetchError::Transient("refused".into())),
            Err(FetchError::Transient("refused".into())),
        ]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        let err = client.search_with_retry(&query()).await.unwrap_err();

        match err {
            AppError::SearchExhausted {
                keyword, attempts, ..
            } => {
                assert_eq!(keyword, "widget");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(clock.sleeps(), secs(&[5, 10]));
    }

    #[tokio::test]
    async fn test_rate_limited_until_budget_exhausted() {
        let backend = ScriptedBackend::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Ok(Vec::new()),
        ]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        let err = client.search_with_retry(&query()).await.unwrap_err();

        match err {
            AppError::SearchExhausted {
                attempts, cause, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(cause, FetchError::RateLimited);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.calls().len(), 3);
        assert_eq!(clock.sleeps(), secs(&[10, 20]));
    }

    #[tokio::test]
    async fn test_server_error_backs_off_exponentially() {
        let backend = ScriptedBackend::new(vec![
            Err(FetchError::Server(503)),
            Err(FetchError::Server(502)),
            Ok(Vec::new()),
        ]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        assert!(client.search_with_retry(&query()).await.unwrap().is_empty());
        assert_eq!(clock.sleeps(), secs(&[5, 10]));
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let backend = ScriptedBackend::new(vec![
            Err(FetchError::Rejected {
                status: 400,
                message: "keyword is not valid".into(),
            }),
            Ok(Vec::new()),
        ]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        let err = client.search_with_retry(&query()).await.unwrap_err();

        assert!(matches!(err, AppError::SearchRejected { .. }));
        assert_eq!(backend.calls().len(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_consecutive_searches_are_throttled() {
        let backend = ScriptedBackend::new(vec![Ok(Vec::new()), Ok(Vec::new())]);
        let clock = Arc::new(ManualClock::new());
        let mut client = client(&backend, &clock);

        client.search(&query()).await.unwrap();
        clock.advance(Duration::from_millis(250));
        client.search(&query()).await.unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(750)]);
    }

    #[test]
    fn test_query_params() {
        let mut entry = KeywordConfig::new("ポケモンカード");
        entry.min_price = Some(1000);
        let credentials = SearchCredentials {
            application_id: "app".into(),
            access_key: "key".into(),
        };

        let params = SearchQuery::for_keyword(&entry, 30).params(&credentials);
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("applicationId"), Some("app"));
        assert_eq!(get("accessKey"), Some("key"));
        assert_eq!(get("keyword"), Some("ポケモンカード"));
        assert_eq!(get("availability"), Some("0"));
        assert_eq!(get("hits"), Some("30"));
        assert_eq!(get("page"), Some("1"));
        assert_eq!(get("format"), Some("json"));
        assert_eq!(get("minPrice"), Some("1000"));
        assert_eq!(get("maxPrice"), None);
    }

    #[test]
    fn test_parse_items_skips_malformed_entries() {
        let body = r#"{
            "count": 3,
            "Items": [
                {"Item": {"itemCode": "s:1", "itemName": "One", "itemPrice": 100,
                          "itemUrl": "https://x/1", "shopName": "S", "availability": 1}},
                {"Item": {"itemCode": "s:2", "itemName": "Two"}},
                {"Item": {"itemCode": "s:3", "itemName": "Three", "itemPrice": 300,
                          "itemUrl": "https://x/3", "shopName": "S", "availability": 0}}
            ]
        }"#;

        let items = parse_items(body).unwrap();
        let codes: Vec<&str> = items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["s:1", "s:3"]);
        assert_eq!(items[1].availability, Availability::OutOfStock);
    }

    #[test]
    fn test_parse_items_rejects_non_json() {
        assert!(matches!(
            parse_items("<html>maintenance</html>"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_provider_message_prefers_description() {
        let body = r#"{"error": "wrong_parameter", "error_description": "keyword is not valid"}"#;
        assert_eq!(provider_message(body), "keyword is not valid");
        assert_eq!(provider_message("plain text"), "plain text");
    }

    #[test]
    fn test_retry_policy_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(5));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
        assert_eq!(policy.rate_limit_wait(0), Duration::from_secs(10));
        assert_eq!(policy.rate_limit_wait(2), Duration::from_secs(30));
    }
}
