//! Stoat/Revolt-compatible webhook channel.
//!
//! The dialect is a reduced cousin of the Discord one: embeds carry a fixed
//! `type: "Text"`, colour travels as a `#RRGGBB` hex string rather than an
//! integer, the avatar key is `avatar` instead of `avatar_url`, and field
//! objects do not exist; fields are folded into the description as
//! markdown lines.

use crate::config::{ChannelKind, StoatSettings};
use crate::traits::{
    AlertChannel, ChannelError, ChannelResult, LogStreamChannel, RetryPolicy,
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use wt_core::{Notification, NotificationField};

/// Display name presented by webhook posts.
const WEBHOOK_USERNAME: &str = "Watchtower";
/// Avatar shown next to webhook posts.
const AVATAR_URL: &str =
    "https://raw.githubusercontent.com/example/watchtower/main/assets/logo.png";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Serialize)]
struct StoatEmbed {
    /// Always `"Text"`; the dialect rejects embeds without it.
    #[serde(rename = "type")]
    embed_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    colour: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct StoatPayload {
    username: String,
    avatar: String,
    embeds: Vec<StoatEmbed>,
}

/// Converts a 24-bit RGB integer into the `#RRGGBB` form the dialect
/// expects: six hex digits, zero-padded, uppercase.
pub fn hex_colour(colour: u32) -> String {
    format!("#{:06X}", colour & 0x00FF_FFFF)
}

/// Folds field entries into description lines for a dialect without native
/// field objects.
fn fields_to_description(fields: &[NotificationField]) -> String {
    fields
        .iter()
        .map(|f| format!("**{}:** {}", f.name, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sends notifications and streamed log batches to a Stoat webhook.
pub struct StoatWebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl StoatWebhookChannel {
    /// Creates a channel from Stoat settings.
    pub fn new(settings: &StoatSettings) -> ChannelResult<Self> {
        let timeout = settings
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::ConfigError(e.to_string()))?;

        Ok(Self {
            url: settings.url.clone(),
            client,
        })
    }

    fn payload(notification: &Notification) -> StoatPayload {
        let mut description = notification.description.clone();
        if !notification.fields.is_empty() {
            description.push_str("\n\n");
            description.push_str(&fields_to_description(&notification.fields));
        }

        StoatPayload {
            username: WEBHOOK_USERNAME.to_string(),
            avatar: AVATAR_URL.to_string(),
            embeds: vec![StoatEmbed {
                embed_type: "Text",
                title: Some(notification.title.clone()),
                description: Some(description),
                colour: Some(hex_colour(notification.color)),
            }],
        }
    }

    async fn post(&self, payload: &StoatPayload) -> ChannelResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(ChannelError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ChannelError::RequestFailed(format!(
                "webhook returned {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl AlertChannel for StoatWebhookChannel {
    fn name(&self) -> &str {
        "stoat"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::StoatWebhook
    }

    fn destination(&self) -> &str {
        &self.url
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, RETRY_BASE_DELAY)
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<()> {
        self.post(&Self::payload(notification)).await
    }
}

#[async_trait]
impl LogStreamChannel for StoatWebhookChannel {
    fn name(&self) -> &str {
        "stoat"
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, RETRY_BASE_DELAY)
    }

    async fn send_log_batch(&self, content: &str, colour: Option<u32>) -> ChannelResult<()> {
        let payload = StoatPayload {
            username: WEBHOOK_USERNAME.to_string(),
            avatar: AVATAR_URL.to_string(),
            embeds: vec![StoatEmbed {
                embed_type: "Text",
                title: None,
                description: Some(format!("```\n{}\n```", content)),
                colour: colour.map(hex_colour),
            }],
        };
        self.post(&payload).await
    }
}
