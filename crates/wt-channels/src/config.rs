//! Channel configuration surface.
//!
//! Configuration is owned and loaded by the embedding application; this
//! module only defines the shape the dispatcher consumes. A channel block
//! that is absent, disabled, or missing its destination is skipped
//! silently; misconfiguration never fails a dispatch.

use crate::secure_string::SecureString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire dialect spoken by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Discord-compatible rich-embed webhook.
    DiscordWebhook,
    /// Stoat/Revolt-compatible webhook: no field objects, hex colour strings.
    StoatWebhook,
    /// ntfy plain-text push with metadata headers.
    Ntfy,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DiscordWebhook => "discord_webhook",
            Self::StoatWebhook => "stoat_webhook",
            Self::Ntfy => "ntfy",
        };
        write!(f, "{}", s)
    }
}

/// Settings for a Discord-dialect webhook destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Whether this channel participates in dispatch.
    #[serde(default)]
    pub enabled: bool,
    /// Full webhook URL.
    #[serde(default)]
    pub url: String,
}

impl WebhookSettings {
    /// True when the channel is enabled and has a destination.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.url.is_empty()
    }
}

/// Settings for the Stoat-dialect webhook destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoatSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Full webhook URL.
    #[serde(default)]
    pub url: String,
    /// Request timeout override in seconds (default 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StoatSettings {
    /// True when the channel is enabled and has a destination.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.url.is_empty()
    }
}

/// Settings for the ntfy plain-text push destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtfySettings {
    #[serde(default)]
    pub enabled: bool,
    /// Server base URL; the topic is appended as a path segment.
    #[serde(default)]
    pub url: String,
    /// Topic to publish to.
    #[serde(default)]
    pub topic: String,
    /// Optional bearer token for protected topics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<SecureString>,
}

impl NtfySettings {
    /// True when the channel is enabled and has both a server and a topic.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.url.is_empty() && !self.topic.is_empty()
    }
}

/// Full alerting configuration: one optional settings block per channel.
///
/// The primary summary webhook and the generic webhook both speak the
/// Discord dialect and may point at the same URL; the dispatcher collapses
/// such duplicates to a single send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Primary run-summary webhook (Discord dialect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion_webhook: Option<WebhookSettings>,
    /// Secondary generic webhook (Discord dialect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookSettings>,
    /// Reduced-dialect webhook (Stoat).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoat: Option<StoatSettings>,
    /// Plain-text push channel (ntfy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntfy: Option<NtfySettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_deserializes() {
        let config: AlertConfig = serde_json::from_str("{}").unwrap();
        assert!(config.conclusion_webhook.is_none());
        assert!(config.webhook.is_none());
        assert!(config.stoat.is_none());
        assert!(config.ntfy.is_none());
    }

    #[test]
    fn test_webhook_settings_active() {
        let settings = WebhookSettings {
            enabled: true,
            url: "https://example.com/hook".to_string(),
        };
        assert!(settings.is_active());

        let disabled = WebhookSettings {
            enabled: false,
            url: "https://example.com/hook".to_string(),
        };
        assert!(!disabled.is_active());

        let no_url = WebhookSettings {
            enabled: true,
            url: String::new(),
        };
        assert!(!no_url.is_active());
    }

    #[test]
    fn test_ntfy_settings_need_topic() {
        let settings = NtfySettings {
            enabled: true,
            url: "https://ntfy.sh".to_string(),
            topic: String::new(),
            auth_token: None,
        };
        assert!(!settings.is_active());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "conclusion_webhook": { "enabled": true, "url": "https://example.com/a" },
            "ntfy": {
                "enabled": true,
                "url": "https://ntfy.example.com",
                "topic": "alerts",
                "auth_token": "tk_secret"
            }
        }"#;

        let config: AlertConfig = serde_json::from_str(json).unwrap();
        assert!(config.conclusion_webhook.unwrap().is_active());

        let ntfy = config.ntfy.unwrap();
        assert!(ntfy.is_active());
        assert_eq!(ntfy.auth_token.unwrap().expose_secret(), "tk_secret");
    }

    #[test]
    fn test_channel_kind_display() {
        assert_eq!(ChannelKind::DiscordWebhook.to_string(), "discord_webhook");
        assert_eq!(ChannelKind::StoatWebhook.to_string(), "stoat_webhook");
        assert_eq!(ChannelKind::Ntfy.to_string(), "ntfy");
    }
}
