//! Discord-compatible rich-embed webhook channel.
//!
//! Translates the canonical notification into the full-featured embed
//! dialect: integer color, native field objects, ISO-8601 timestamp, and a
//! thumbnail. Two destinations of this dialect are typically configured (a
//! primary summary hook and a generic one), so the `name` passed at
//! construction labels which one is speaking in logs.

use crate::config::{ChannelKind, WebhookSettings};
use crate::traits::{AlertChannel, ChannelError, ChannelResult, RetryPolicy};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Serialize;
use std::time::Duration;
use wt_core::{Notification, NotificationField};

/// Display name presented by webhook posts.
const WEBHOOK_USERNAME: &str = "Watchtower";
/// Avatar shown next to webhook posts, doubling as the embed thumbnail.
const AVATAR_URL: &str =
    "https://raw.githubusercontent.com/example/watchtower/main/assets/logo.png";

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Serialize)]
struct EmbedThumbnail {
    url: String,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedFooter {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<NotificationField>,
    timestamp: String,
    thumbnail: EmbedThumbnail,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Serialize)]
struct WebhookPayload {
    username: String,
    avatar_url: String,
    embeds: Vec<Embed>,
}

/// Sends notifications to a Discord-compatible webhook endpoint.
pub struct DiscordWebhookChannel {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl DiscordWebhookChannel {
    /// Creates a channel from webhook settings. The `name` labels this
    /// destination in logs (e.g. `conclusion-webhook`, `webhook`).
    pub fn new(name: impl Into<String>, settings: &WebhookSettings) -> ChannelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::ConfigError(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            url: settings.url.clone(),
            client,
        })
    }

    fn payload(notification: &Notification) -> WebhookPayload {
        WebhookPayload {
            username: WEBHOOK_USERNAME.to_string(),
            avatar_url: AVATAR_URL.to_string(),
            embeds: vec![Embed {
                title: notification.title.clone(),
                description: notification.description.clone(),
                color: notification.color,
                fields: notification.fields.clone(),
                timestamp: notification
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                thumbnail: EmbedThumbnail {
                    url: AVATAR_URL.to_string(),
                },
                footer: Some(EmbedFooter {
                    text: WEBHOOK_USERNAME.to_string(),
                    icon_url: None,
                }),
            }],
        }
    }
}

#[async_trait]
impl AlertChannel for DiscordWebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::DiscordWebhook
    }

    fn destination(&self) -> &str {
        &self.url
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, RETRY_BASE_DELAY)
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(notification))
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

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::colors;

    fn sample_notification() -> Notification {
        Notification::new("Run complete", "All searches finished")
            .with_color(colors::GREEN)
            .with_fields(vec![
                NotificationField::inline("Points", "150"),
                NotificationField::new("Account", "user@example.com"),
            ])
    }

    #[test]
    fn test_payload_shape() {
        let payload = DiscordWebhookChannel::payload(&sample_notification());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["username"], "Watchtower");
        assert!(json["avatar_url"].as_str().unwrap().starts_with("https://"));

        let embed = &json["embeds"][0];
        assert_eq!(embed["title"], "Run complete");
        assert_eq!(embed["color"], colors::GREEN);
        assert_eq!(embed["fields"][0]["name"], "Points");
        assert_eq!(embed["fields"][0]["inline"], true);
        assert!(embed["fields"][1].get("inline").is_none());
        assert!(embed["thumbnail"]["url"].is_string());
        assert_eq!(embed["footer"]["text"], "Watchtower");
        assert!(embed["footer"].get("icon_url").is_none());
    }

    #[test]
    fn test_color_serialized_as_integer() {
        let notification = Notification::new("t", "d").with_color(colors::RED);
        let payload = DiscordWebhookChannel::payload(&notification);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"color\":16711680"));
    }

    #[test]
    fn test_timestamp_is_iso8601_utc() {
        let payload = DiscordWebhookChannel::payload(&sample_notification());
        let timestamp = &payload.embeds[0].timestamp;
        assert!(timestamp.ends_with('Z'));
        assert!(timestamp.contains('T'));
    }

    #[test]
    fn test_empty_fields_omitted() {
        let notification = Notification::new("t", "d");
        let payload = DiscordWebhookChannel::payload(&notification);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("\"fields\""));
    }

    #[test]
    fn test_channel_metadata() {
        let settings = WebhookSettings {
            enabled: true,
            url: "https://discord.example.com/api/webhooks/1/abc".to_string(),
        };
        let channel = DiscordWebhookChannel::new("conclusion-webhook", &settings).unwrap();
        assert_eq!(channel.name(), "conclusion-webhook");
        assert_eq!(channel.kind(), ChannelKind::DiscordWebhook);
        assert_eq!(channel.destination(), settings.url);
        assert_eq!(
            channel.retry_policy(),
            RetryPolicy::new(3, Duration::from_millis(1000))
        );
        assert!(!channel.best_effort());
    }
}
