//! High-level reporting entry points used by the automation pipeline.
//!
//! Both are fire-and-forget: the pipeline hands over a signal or a summary
//! and moves on; delivery outcomes surface through logs and the returned
//! outcome list only.

use crate::config::AlertConfig;
use crate::dispatch::{ChannelOutcome, Dispatcher};
use tracing::warn;
use wt_core::{classify, colors, Notification, NotificationField};

/// Longest raw-signal excerpt attached to a restriction notification.
const SIGNAL_PREVIEW_MAX: usize = 1000;

/// Classifies a raw failure signal and, when it indicates an account
/// restriction, escalates it through every configured channel.
///
/// Returns `None` when the signal does not classify (including the known
/// transient wordings), in which case nothing is sent.
pub async fn report_failure(
    config: &AlertConfig,
    raw_signal: &str,
) -> Option<Vec<ChannelOutcome>> {
    let reason = classify(raw_signal)?;
    warn!(reason = %reason, "account restriction detected");

    let notification = Notification::new(
        "Account restriction detected",
        format!("Automation stopped: {}", reason.description()),
    )
    .with_color(colors::RED)
    .with_fields(vec![NotificationField::new(
        "Signal",
        truncate(raw_signal, SIGNAL_PREVIEW_MAX),
    )]);

    Some(Dispatcher::from_config(config).dispatch(&notification).await)
}

/// Dispatches a pre-shaped run-summary notification through every
/// configured channel.
pub async fn report_summary(
    config: &AlertConfig,
    title: &str,
    description: &str,
    fields: Vec<NotificationField>,
    color: Option<u32>,
) -> Vec<ChannelOutcome> {
    let mut notification = Notification::new(title, description).with_fields(fields);
    if let Some(color) = color {
        notification = notification.with_color(color);
    }

    Dispatcher::from_config(config).dispatch(&notification).await
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut excerpt: String = text.chars().take(max_chars).collect();
        excerpt.push('…');
        excerpt
    }
}
