//! API credentials taken from the process environment.

use std::env;

use crate::error::{AppError, Result};

pub const ENV_APP_ID: &str = "RAKUTEN_APP_ID";
pub const ENV_ACCESS_KEY: &str = "RAKUTEN_ACCESS_KEY";
pub const ENV_LINE_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const ENV_LINE_USER: &str = "LINE_USER_ID";

/// Search API identity. Both values are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    pub application_id: String,
    pub access_key: String,
}

/// Push channel identity. Notifications are disabled without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCredentials {
    pub channel_token: String,
    pub recipient_id: String,
}

/// All credentials a run needs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub search: SearchCredentials,
    pub notify: Option<NotifyCredentials>,
}

impl Credentials {
    /// Read credentials from the environment.
    ///
    /// Missing search credentials are fatal; missing notification
    /// credentials only disable notifications.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    /// Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let search = match (get(ENV_APP_ID), get(ENV_ACCESS_KEY)) {
            (Some(application_id), Some(access_key)) => SearchCredentials {
                application_id,
                access_key,
            },
            (app_id, key) => {
                let missing: Vec<&str> = [
                    (ENV_APP_ID, app_id.is_none()),
                    (ENV_ACCESS_KEY, key.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(AppError::missing_credentials(missing.join(", ")));
            }
        };

        let notify = match (get(ENV_LINE_TOKEN), get(ENV_LINE_USER)) {
            (Some(channel_token), Some(recipient_id)) => Some(NotifyCredentials {
                channel_token,
                recipient_id,
            }),
            _ => None,
        };

        Ok(Self { search, notify })
    }
}
