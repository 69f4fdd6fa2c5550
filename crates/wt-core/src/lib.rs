//! # wt-core
//!
//! Failure classification and the canonical notification model for Watchtower.
//!
//! This crate provides the restriction classifier that maps raw failure text
//! onto a taxonomy of known block causes, and the immutable notification
//! model shared by every alert channel.

pub mod notification;
pub mod restriction;

pub use notification::{colors, Notification, NotificationField, Severity};
pub use restriction::{classify, classify_error, RestrictionReason};
