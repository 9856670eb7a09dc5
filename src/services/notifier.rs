// src/services/notifier.rs

//! Restock alerts over the LINE Messaging API push endpoint.
//!
//! Transitions are rendered into text blocks and packed into as few
//! messages as the per-message ceiling allows. Delivery is best-effort:
//! a failed push is logged and the remaining messages are still sent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{NotifyConfig, NotifyCredentials, Transition};
use crate::utils::http::create_async_client;
use crate::utils::{group_thousands, truncate_chars};

/// Delivers one text message.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct PushBody<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Push transport for the LINE Messaging API.
pub struct LinePushTransport {
    client: Client,
    endpoint: String,
    credentials: NotifyCredentials,
}

impl LinePushTransport {
    pub fn new(config: &NotifyConfig, credentials: NotifyCredentials) -> Result<Self> {
        Ok(Self {
            client: create_async_client(
                concat!("restock/", env!("CARGO_PKG_VERSION")),
                config.timeout_secs,
            )?,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl PushTransport for LinePushTransport {
    async fn push(&self, text: &str) -> Result<()> {
        let body = PushBody {
            to: &self.credentials.recipient_id,
            messages: [TextMessage { kind: "text", text }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.credentials.channel_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_chars(detail.trim(), 200)
            )));
        }
        Ok(())
    }
}

/// Renders and sends restock alerts.
pub struct Notifier {
    transport: Option<Box<dyn PushTransport>>,
    header: String,
    currency_suffix: String,
    max_chars: usize,
}

impl Notifier {
    pub fn new(transport: Option<Box<dyn PushTransport>>, config: &NotifyConfig) -> Self {
        Self {
            transport,
            header: config.header.clone(),
            currency_suffix: config.currency_suffix.clone(),
            max_chars: config.max_message_chars.max(1),
        }
    }

    /// Build a notifier; without credentials it stays disabled.
    pub fn from_config(
        config: &NotifyConfig,
        credentials: Option<NotifyCredentials>,
    ) -> Result<Self> {
        let transport = match credentials {
            Some(credentials) => Some(
                Box::new(LinePushTransport::new(config, credentials)?) as Box<dyn PushTransport>
            ),
            None => None,
        };
        Ok(Self::new(transport, config))
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    fn render_header(&self) -> String {
        format!("{}\n", self.header)
    }

    /// Text block for one transition.
    pub fn render_block(&self, transition: &Transition) -> String {
        format!(
            "\n✅ {}\n   💰 {}{}\n   🏪 {}\n   🔗 {}\n",
            transition.item_name,
            group_thousands(transition.item_price),
            self.currency_suffix,
            transition.shop_name,
            transition.item_url
        )
    }

    /// Pack the header and all blocks into messages of at most `max_chars`.
    pub fn build_messages(&self, transitions: &[Transition]) -> Vec<String> {
        let blocks = std::iter::once(self.render_header())
            .chain(transitions.iter().map(|t| self.render_block(t)));

        let mut messages = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0;

        for block in blocks {
            let block = truncate_chars(&block, self.max_chars);
            let block_chars = block.chars().count();

            if !buffer.is_empty() && buffer_chars + block_chars > self.max_chars {
                messages.push(finish(&buffer));
                buffer.clear();
                buffer_chars = 0;
            }
            buffer.push_str(block);
            buffer_chars += block_chars;
        }
        if !buffer.is_empty() {
            messages.push(finish(&buffer));
        }
        messages
    }

    /// Send alerts for `transitions`; returns the number of messages delivered.
    pub async fn send_stock_alerts(&self, transitions: &[Transition]) -> usize {
        let Some(transport) = &self.transport else {
            log::info!("[notify] Not configured, skipping");
            return 0;
        };
        if transitions.is_empty() {
            return 0;
        }

        let messages = self.build_messages(transitions);
        let total = messages.len();
        let mut sent = 0;

        for (index, message) in messages.iter().enumerate() {
            match transport.push(message).await {
                Ok(()) => sent += 1,
                Err(e) => log::error!("[notify] Send failed ({}/{}): {}", index + 1, total, e),
            }
        }

        log::info!(
            "[notify] {} transition(s) → {}/{} message(s) sent",
            transitions.len(),
            sent,
            total
        );
        sent
    }
}

fn finish(buffer: &str) -> String {
    buffer.trim().to_string()
}
