//! Channel trait and error definitions.
//!
//! Every wire dialect sits behind [`AlertChannel`]: translate the canonical
//! notification into the dialect's payload and perform exactly one network
//! attempt. Bounded retry, backoff, and outcome logging belong to the
//! dispatcher, never to the adapter.

use crate::config::ChannelKind;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use wt_core::Notification;

/// Errors that can occur while delivering to a channel.
#[derive(Error, Debug, Clone)]
pub enum ChannelError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("channel {channel} exhausted after {attempts} attempts: {source}")]
    Exhausted {
        channel: String,
        attempts: u32,
        #[source]
        source: Box<ChannelError>,
    },
}

impl ChannelError {
    /// Maps a transport error onto the channel error taxonomy. A timeout is
    /// an ordinary failed attempt and consumes one retry slot.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionFailed(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Bounded retry with exponential backoff, applied by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff to wait after a failure on `attempt` (1-based), or `None`
    /// when that attempt was the last one.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay * 2u32.saturating_pow(attempt - 1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// One alert destination speaking a specific wire dialect.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Label used in logs and outcomes.
    fn name(&self) -> &str;

    /// Wire dialect this channel speaks.
    fn kind(&self) -> ChannelKind;

    /// Destination URL; together with the kind it keys duplicate collapsing.
    fn destination(&self) -> &str;

    /// Retry schedule the dispatcher applies to this channel.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Best-effort channels never surface terminal failures to callers;
    /// exhaustion is logged to the diagnostic sink and swallowed.
    fn best_effort(&self) -> bool {
        false
    }

    /// Translates the notification and performs a single network attempt.
    async fn send(&self, notification: &Notification) -> ChannelResult<()>;
}

/// A channel that can stream pre-formatted log batches.
///
/// Separate from [`AlertChannel`] because a batch is raw text, not a
/// notification, and because its terminal failures are raised to the
/// caller rather than swallowed.
#[async_trait]
pub trait LogStreamChannel: Send + Sync {
    /// Label used in logs and errors.
    fn name(&self) -> &str;

    /// Retry schedule the dispatcher applies to batch sends.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Sends one pre-formatted batch; a single network attempt.
    async fn send_log_batch(&self, content: &str, colour: Option<u32>) -> ChannelResult<()>;
}
