//! Canonical notification model shared by every alert channel.
//!
//! One [`Notification`] is built per event and handed unchanged to each
//! channel adapter, which translates it into its own wire dialect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named accent colors for notifications (24-bit RGB).
pub mod colors {
    pub const RED: u32 = 0xFF0000;
    pub const CRIMSON: u32 = 0xDC143C;
    pub const ORANGE: u32 = 0xFFA500;
    pub const AMBER: u32 = 0xFFAA00;
    pub const BLUE: u32 = 0x3498DB;
    pub const GREEN: u32 = 0x00D26A;
    pub const GRAY: u32 = 0x95A5A6;
    /// Accent used when the caller supplies no color.
    pub const DEFAULT: u32 = 0x0078D4;
}

/// A single name/value entry, rendered natively by channels that support
/// field objects and flattened to text by those that do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl NotificationField {
    /// Creates a block field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: None,
        }
    }

    /// Creates an inline field.
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: Some(true),
        }
    }
}

/// Severity bucket derived from the notification color.
///
/// Drives the plain-text channel's priority and tag headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
    Log,
}

impl Severity {
    /// Red means error, amber means warning, anything else is a plain log.
    pub fn from_color(color: u32) -> Self {
        match color {
            colors::RED => Self::Error,
            colors::AMBER => Self::Warn,
            _ => Self::Log,
        }
    }
}

/// Immutable message delivered to every enabled channel.
///
/// Created per event and discarded after dispatch; construction never
/// fails and performs no validation beyond accepting the given values.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Body text; markdown-capable on channels that render it.
    pub description: String,
    /// Ordered name/value entries.
    pub fields: Vec<NotificationField>,
    /// 24-bit RGB accent color.
    pub color: u32,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification with the default accent color and the
    /// current time.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            color: colors::DEFAULT,
            timestamp: Utc::now(),
        }
    }

    /// Sets the ordered field entries.
    pub fn with_fields(mut self, fields: Vec<NotificationField>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the accent color.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Severity bucket implied by the accent color.
    pub fn severity(&self) -> Severity {
        Severity::from_color(self.color)
    }
}
