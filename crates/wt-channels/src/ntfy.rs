//! ntfy push channel: plain text body with metadata carried in headers.
//!
//! The dialect has no structured payload at all. The notification is
//! flattened to text, severity maps onto the `Priority` and `Tags` headers,
//! and an optional bearer token protects the topic. This channel is
//! best-effort by contract: its failures never interrupt a dispatch and are
//! only visible in the diagnostic log.

use crate::config::{ChannelKind, NtfySettings};
use crate::secure_string::SecureString;
use crate::traits::{AlertChannel, ChannelError, ChannelResult, RetryPolicy};
use async_trait::async_trait;
use std::time::Duration;
use wt_core::{Notification, Severity};

/// Fixed `Title` header on every push.
const NTFY_TITLE: &str = "Watchtower";

const NTFY_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// `Priority` header value and tag icon for each severity bucket.
/// Tags are ntfy emoji shortcodes, see https://docs.ntfy.sh/emojis/
fn priority_for(severity: Severity) -> (&'static str, &'static str) {
    match severity {
        Severity::Error => ("max", "rotating_light"),
        Severity::Warn => ("high", "warning"),
        Severity::Log => ("default", "medal_sports"),
    }
}

/// Sends plain-text pushes to an ntfy topic.
pub struct NtfyChannel {
    /// `{base_url}/{topic}`.
    url: String,
    auth_token: Option<SecureString>,
    client: reqwest::Client,
}

impl NtfyChannel {
    /// Creates a channel from ntfy settings.
    pub fn new(settings: &NtfySettings) -> ChannelResult<Self> {
        let url = format!("{}/{}", settings.url.trim_end_matches('/'), settings.topic);

        let client = reqwest::Client::builder()
            .timeout(NTFY_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::ConfigError(e.to_string()))?;

        Ok(Self {
            url,
            auth_token: settings.auth_token.clone(),
            client,
        })
    }

    /// Flattens the notification into the plain-text body.
    fn body(notification: &Notification) -> String {
        let mut body = format!("{}\n{}", notification.title, notification.description);
        if !notification.fields.is_empty() {
            body.push_str("\n\n");
            let lines: Vec<String> = notification
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.name, f.value))
                .collect();
            body.push_str(&lines.join("\n"));
        }
        body
    }
}

#[async_trait]
impl AlertChannel for NtfyChannel {
    fn name(&self) -> &str {
        "ntfy"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Ntfy
    }

    fn destination(&self) -> &str {
        &self.url
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, RETRY_BASE_DELAY)
    }

    fn best_effort(&self) -> bool {
        true
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<()> {
        let (priority, tags) = priority_for(notification.severity());

        let mut request = self
            .client
            .post(&self.url)
            .header("Title", NTFY_TITLE)
            .header("Priority", priority)
            .header("Tags", tags)
            .body(Self::body(notification));

        if let Some(token) = &self.auth_token {
            request = request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = request.send().await.map_err(ChannelError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ChannelError::RequestFailed(format!(
                "ntfy returned {}",
                status
            )))
        }
    }
}
