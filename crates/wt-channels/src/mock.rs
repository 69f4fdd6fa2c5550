//! Mock alert channel for testing delivery behavior.
//!
//! Records every send for test verification and fails a configurable
//! number of attempts before succeeding, which makes retry, backoff, and
//! isolation behavior observable without a network.

use crate::config::ChannelKind;
use crate::traits::{
    AlertChannel, ChannelError, ChannelResult, LogStreamChannel, RetryPolicy,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use wt_core::Notification;

/// Sentinel for "fail every attempt".
const ALWAYS: u32 = u32::MAX;

/// Mock channel that records deliveries and injects failures.
pub struct MockChannel {
    name: String,
    kind: ChannelKind,
    destination: String,
    retry: RetryPolicy,
    best_effort: bool,
    /// Notifications that were accepted.
    delivered: Arc<RwLock<Vec<Notification>>>,
    /// Log batches that were accepted, as (content, colour).
    batches: Arc<RwLock<Vec<(String, Option<u32>)>>>,
    /// Total send attempts, including failed ones.
    calls: Arc<RwLock<u32>>,
    /// Attempts left to fail; `ALWAYS` never decrements.
    fail_remaining: Arc<RwLock<u32>>,
}

impl MockChannel {
    /// Creates a mock channel with a fast retry schedule.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ChannelKind::DiscordWebhook,
            destination: format!("mock://{}", name),
            retry: RetryPolicy::new(3, Duration::from_millis(1)),
            best_effort: false,
            delivered: Arc::new(RwLock::new(Vec::new())),
            batches: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(0)),
            fail_remaining: Arc::new(RwLock::new(0)),
        }
    }

    /// Sets the wire dialect reported by the mock.
    pub fn with_kind(mut self, kind: ChannelKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the destination used for duplicate collapsing.
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = destination.to_string();
        self
    }

    /// Sets the retry schedule reported to the dispatcher.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Marks the channel best-effort.
    pub fn with_best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Fails the next `n` attempts, then succeeds.
    pub async fn fail_times(&self, n: u32) {
        *self.fail_remaining.write().await = n;
    }

    /// Fails every attempt.
    pub async fn always_fail(&self) {
        *self.fail_remaining.write().await = ALWAYS;
    }

    /// Total send attempts observed, including failed ones.
    pub async fn call_count(&self) -> u32 {
        *self.calls.read().await
    }

    /// Notifications that were accepted.
    pub async fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().await.clone()
    }

    /// Number of accepted notifications.
    pub async fn delivered_count(&self) -> usize {
        self.delivered.read().await.len()
    }

    /// Log batches that were accepted.
    pub async fn batches(&self) -> Vec<(String, Option<u32>)> {
        self.batches.read().await.clone()
    }

    async fn register_attempt(&self) -> ChannelResult<()> {
        *self.calls.write().await += 1;

        let mut remaining = self.fail_remaining.write().await;
        if *remaining > 0 {
            if *remaining != ALWAYS {
                *remaining -= 1;
            }
            return Err(ChannelError::RequestFailed("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn destination(&self) -> &str {
        &self.destination
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn best_effort(&self) -> bool {
        self.best_effort
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<()> {
        self.register_attempt().await?;
        self.delivered.write().await.push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl LogStreamChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn send_log_batch(&self, content: &str, colour: Option<u32>) -> ChannelResult<()> {
        self.register_attempt().await?;
        self.batches
            .write()
            .await
            .push((content.to_string(), colour));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries() {
        let channel = MockChannel::new("test");
        channel
            .send(&Notification::new("Alert", "Something happened"))
            .await
            .unwrap();

        let delivered = channel.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "Alert");
        assert_eq!(channel.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_fail_times_then_succeed() {
        let channel = MockChannel::new("test");
        channel.fail_times(2).await;

        assert!(channel.send(&Notification::new("t", "d")).await.is_err());
        assert!(channel.send(&Notification::new("t", "d")).await.is_err());
        assert!(channel.send(&Notification::new("t", "d")).await.is_ok());

        assert_eq!(channel.call_count().await, 3);
        assert_eq!(channel.delivered_count().await, 1);
    }

    #[tokio::test]
    async fn test_always_fail() {
        let channel = MockChannel::new("test");
        channel.always_fail().await;

        for _ in 0..5 {
            assert!(channel.send(&Notification::new("t", "d")).await.is_err());
        }
        assert_eq!(channel.delivered_count().await, 0);
    }

    #[tokio::test]
    async fn test_records_log_batches() {
        let channel = MockChannel::new("test");
        channel
            .send_log_batch("line one\nline two", Some(0xFF0000))
            .await
            .unwrap();

        let batches = channel.batches().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, "line one\nline two");
        assert_eq!(batches[0].1, Some(0xFF0000));
    }
}
