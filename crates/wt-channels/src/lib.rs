//! # wt-channels
//!
//! Alert channel adapters and the concurrent delivery engine for Watchtower.
//!
//! Three wire dialects sit behind the [`AlertChannel`] trait: a
//! Discord-compatible rich-embed webhook, a Stoat/Revolt-compatible webhook
//! without field objects, and an ntfy plain-text push with metadata headers.
//! The [`Dispatcher`] fans one notification out to every enabled channel
//! concurrently, retries each channel independently with exponential
//! backoff, and never lets one channel's failure touch another.

pub mod config;
pub mod discord;
pub mod dispatch;
pub mod mock;
pub mod ntfy;
pub mod report;
pub mod secure_string;
pub mod stoat;
pub mod traits;

// Re-export the channel surface
pub use config::{AlertConfig, ChannelKind, NtfySettings, StoatSettings, WebhookSettings};
pub use discord::DiscordWebhookChannel;
pub use dispatch::{ChannelOutcome, Dispatcher};
pub use mock::MockChannel;
pub use ntfy::NtfyChannel;
pub use report::{report_failure, report_summary};
pub use secure_string::SecureString;
pub use stoat::{hex_colour, StoatWebhookChannel};
pub use traits::{AlertChannel, ChannelError, ChannelResult, LogStreamChannel, RetryPolicy};
