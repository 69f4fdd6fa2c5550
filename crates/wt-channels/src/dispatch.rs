//! Concurrent fan-out delivery with per-channel bounded retry.
//!
//! One notification goes to every enabled channel at once. Channels never
//! wait on each other: the dispatcher joins the whole set at a barrier, and
//! a slow or failing destination cannot delay or cancel a sibling. Each
//! channel retries independently with exponential backoff, and its terminal
//! outcome is logged.

use crate::config::AlertConfig;
use crate::discord::DiscordWebhookChannel;
use crate::ntfy::NtfyChannel;
use crate::stoat::StoatWebhookChannel;
use crate::traits::{AlertChannel, ChannelError, ChannelResult, LogStreamChannel};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use wt_core::Notification;

/// Terminal result of delivering one notification to one channel.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    /// Channel label.
    pub channel: String,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// Terminal result; an `Err` is always [`ChannelError::Exhausted`].
    pub result: ChannelResult<()>,
}

impl ChannelOutcome {
    /// True when the channel reached the succeeded state.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fans one notification out to every configured channel.
pub struct Dispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
    log_stream: Option<Arc<dyn LogStreamChannel>>,
}

impl Dispatcher {
    /// Builds a dispatcher from the externally-owned alert configuration.
    ///
    /// Disabled or incomplete channel blocks are skipped silently; a
    /// channel whose transport fails to construct is skipped with a
    /// warning. Misconfiguration never fails a dispatch.
    pub fn from_config(config: &AlertConfig) -> Self {
        let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::new();
        let mut log_stream: Option<Arc<dyn LogStreamChannel>> = None;

        if let Some(settings) = config
            .conclusion_webhook
            .as_ref()
            .filter(|s| s.is_active())
        {
            match DiscordWebhookChannel::new("conclusion-webhook", settings) {
                Ok(channel) => channels.push(Arc::new(channel)),
                Err(e) => warn!(error = %e, "skipping conclusion webhook channel"),
            }
        }

        if let Some(settings) = config.webhook.as_ref().filter(|s| s.is_active()) {
            match DiscordWebhookChannel::new("webhook", settings) {
                Ok(channel) => channels.push(Arc::new(channel)),
                Err(e) => warn!(error = %e, "skipping generic webhook channel"),
            }
        }

        if let Some(settings) = config.stoat.as_ref().filter(|s| s.is_active()) {
            match StoatWebhookChannel::new(settings) {
                Ok(channel) => {
                    let channel = Arc::new(channel);
                    log_stream = Some(channel.clone() as Arc<dyn LogStreamChannel>);
                    channels.push(channel);
                }
                Err(e) => warn!(error = %e, "skipping stoat channel"),
            }
        }

        if let Some(settings) = config.ntfy.as_ref().filter(|s| s.is_active()) {
            match NtfyChannel::new(settings) {
                Ok(channel) => channels.push(Arc::new(channel)),
                Err(e) => warn!(error = %e, "skipping ntfy channel"),
            }
        }

        Self {
            channels,
            log_stream,
        }
    }

    /// Builds a dispatcher over pre-constructed channels.
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self {
            channels,
            log_stream: None,
        }
    }

    /// Attaches the destination for [`Self::dispatch_log_batch`].
    pub fn with_log_stream(mut self, stream: Arc<dyn LogStreamChannel>) -> Self {
        self.log_stream = Some(stream);
        self
    }

    /// Number of configured channels, before duplicate collapsing.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Delivers `notification` to every distinct channel concurrently and
    /// returns each channel's terminal outcome.
    ///
    /// Fire-and-forget: this method never fails. An exhausted channel is
    /// logged at error severity (best-effort channels at debug) and
    /// reported only in the returned outcomes.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<ChannelOutcome> {
        let targets = self.distinct_channels();
        if targets.is_empty() {
            debug!("no alert channels configured, skipping dispatch");
            return Vec::new();
        }

        let sends = targets
            .iter()
            .map(|channel| send_with_retry(channel.as_ref(), notification));

        futures::future::join_all(sends).await
    }

    /// Streams a pre-formatted log batch to the reduced-dialect channel.
    ///
    /// Unlike [`Self::dispatch`], a terminal failure here is returned to
    /// the caller: the log streamer needs to know a batch was dropped so it
    /// can re-buffer or back off. Silently succeeds when no stream channel
    /// is configured.
    pub async fn dispatch_log_batch(
        &self,
        content: &str,
        colour: Option<u32>,
    ) -> ChannelResult<()> {
        let Some(stream) = &self.log_stream else {
            return Ok(());
        };

        let policy = stream.retry_policy();
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts {
            match stream.send_log_batch(content, colour).await {
                Ok(()) => {
                    debug!(channel = stream.name(), attempt, "log batch delivered");
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        channel = stream.name(),
                        attempt,
                        error = %e,
                        "log batch attempt failed"
                    );
                    last_error = Some(e);
                    if let Some(delay) = policy.backoff(attempt) {
                        sleep(delay).await;
                    }
                }
            }
        }

        let exhausted = ChannelError::Exhausted {
            channel: stream.name().to_string(),
            attempts: policy.max_attempts,
            source: Box::new(last_error.unwrap_or_else(|| {
                ChannelError::ConfigError("retry policy allowed no attempts".to_string())
            })),
        };
        error!(channel = stream.name(), error = %exhausted, "log batch delivery exhausted");
        Err(exhausted)
    }

    /// Collapses channels that would double-post the same payload to the
    /// same destination (typically two Discord-dialect configs pointing at
    /// one URL). The first occurrence wins.
    fn distinct_channels(&self) -> Vec<Arc<dyn AlertChannel>> {
        let mut seen = HashSet::new();
        self.channels
            .iter()
            .filter(|channel| seen.insert((channel.kind(), channel.destination().to_string())))
            .cloned()
            .collect()
    }
}

/// Drives one channel through its retry state machine to a terminal state.
///
/// A failed attempt waits `base_delay * 2^(attempt-1)` before the next one;
/// there is no wait after the final attempt.
async fn send_with_retry(
    channel: &dyn AlertChannel,
    notification: &Notification,
) -> ChannelOutcome {
    let policy = channel.retry_policy();
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match channel.send(notification).await {
            Ok(()) => {
                info!(channel = channel.name(), attempt, "notification delivered");
                return ChannelOutcome {
                    channel: channel.name().to_string(),
                    attempts: attempt,
                    result: Ok(()),
                };
            }
            Err(e) => {
                warn!(
                    channel = channel.name(),
                    attempt,
                    error = %e,
                    "delivery attempt failed"
                );
                last_error = Some(e);
                if let Some(delay) = policy.backoff(attempt) {
                    sleep(delay).await;
                }
            }
        }
    }

    let exhausted = ChannelError::Exhausted {
        channel: channel.name().to_string(),
        attempts: policy.max_attempts,
        source: Box::new(last_error.unwrap_or_else(|| {
            ChannelError::ConfigError("retry policy allowed no attempts".to_string())
        })),
    };

    if channel.best_effort() {
        debug!(channel = channel.name(), error = %exhausted, "best-effort delivery exhausted");
    } else {
        error!(channel = channel.name(), error = %exhausted, "notification delivery exhausted");
    }

    ChannelOutcome {
        channel: channel.name().to_string(),
        attempts: policy.max_attempts,
        result: Err(exhausted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NtfySettings, StoatSettings, WebhookSettings};
    use crate::mock::MockChannel;
    use crate::traits::RetryPolicy;
    use std::time::Duration;

    fn quick_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_dispatch_with_no_channels() {
        let dispatcher = Dispatcher::new(Vec::new());
        let outcomes = dispatcher
            .dispatch(&Notification::new("t", "d"))
            .await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_succeeds_first_attempt() {
        let channel = Arc::new(MockChannel::new("a").with_retry_policy(quick_retry()));
        let dispatcher = Dispatcher::new(vec![channel.clone()]);

        let outcomes = dispatcher.dispatch(&Notification::new("t", "d")).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded());
        assert_eq!(outcomes[0].attempts, 1);
        assert_eq!(channel.delivered_count().await, 1);
    }

    #[tokio::test]
    async fn test_from_config_skips_disabled_channels() {
        let config = AlertConfig {
            conclusion_webhook: Some(WebhookSettings {
                enabled: false,
                url: "https://example.com/a".to_string(),
            }),
            webhook: None,
            stoat: Some(StoatSettings {
                enabled: true,
                url: String::new(),
                timeout_secs: None,
            }),
            ntfy: Some(NtfySettings {
                enabled: true,
                url: "https://ntfy.example.com".to_string(),
                topic: String::new(),
                auth_token: None,
            }),
        };

        let dispatcher = Dispatcher::from_config(&config);
        assert_eq!(dispatcher.channel_count(), 0);
        assert!(dispatcher.log_stream.is_none());
    }

    #[tokio::test]
    async fn test_from_config_builds_enabled_channels() {
        let config = AlertConfig {
            conclusion_webhook: Some(WebhookSettings {
                enabled: true,
                url: "https://example.com/a".to_string(),
            }),
            webhook: Some(WebhookSettings {
                enabled: true,
                url: "https://example.com/b".to_string(),
            }),
            stoat: Some(StoatSettings {
                enabled: true,
                url: "https://stoat.example.com/hook".to_string(),
                timeout_secs: None,
            }),
            ntfy: Some(NtfySettings {
                enabled: true,
                url: "https://ntfy.example.com".to_string(),
                topic: "alerts".to_string(),
                auth_token: None,
            }),
        };

        let dispatcher = Dispatcher::from_config(&config);
        assert_eq!(dispatcher.channel_count(), 4);
        assert!(dispatcher.log_stream.is_some());
    }

    #[tokio::test]
    async fn test_distinct_channels_collapse_same_destination() {
        let first = Arc::new(
            MockChannel::new("conclusion-webhook")
                .with_destination("https://example.com/same"),
        );
        let second =
            Arc::new(MockChannel::new("webhook").with_destination("https://example.com/same"));
        let dispatcher = Dispatcher::new(vec![first, second]);

        assert_eq!(dispatcher.distinct_channels().len(), 1);
    }
}
