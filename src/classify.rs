//! Classification of raw extractor failure text into user-facing messages.
//!
//! yt-dlp reports failures as free-form error strings. This module maps the
//! common failure families onto fixed, user-facing messages via
//! case-insensitive substring rules. The first matching rule wins; anything
//! unmatched falls through to a generic message carrying the raw text.

/// YouTube's bot-check interstitial, the most common cookie-less failure.
pub const MSG_BOT_CHECK: &str =
    "Sign-in required: YouTube is asking to confirm you are not a bot. Upload a cookies file and try again.";

/// Generic sign-in + bot wording that does not match the exact interstitial text.
pub const MSG_SIGN_IN: &str =
    "Authentication required: sign in to your account and upload a cookies file.";

/// Private videos need an authenticated session.
pub const MSG_PRIVATE: &str = "This video is private and requires authentication.";

/// Age gate can only be passed with account cookies.
pub const MSG_AGE_RESTRICTED: &str =
    "This video is age-restricted. Upload a cookies file to verify your age.";

/// The uploaded cookie file was rejected by the tool.
pub const MSG_COOKIE_FORMAT: &str =
    "Cookie file is not in Netscape format. Re-export your cookies and upload again.";

/// Catch-all for region locks and takedowns.
pub const MSG_UNAVAILABLE: &str =
    "This video is unavailable. It may be region-locked or require authentication.";

/// A single classification rule: all needles must appear (case-insensitive)
/// in the raw error text for the rule to fire.
struct Rule {
    needles: &'static [&'static str],
    message: &'static str,
}

/// Ordered rule table; first match wins.
const RULES: &[Rule] = &[
    Rule {
        needles: &["sign in to confirm you're not a bot"],
        message: MSG_BOT_CHECK,
    },
    Rule {
        needles: &["sign in", "bot"],
        message: MSG_SIGN_IN,
    },
    Rule {
        needles: &["private"],
        message: MSG_PRIVATE,
    },
    Rule {
        needles: &["age restricted"],
        message: MSG_AGE_RESTRICTED,
    },
    Rule {
        needles: &["cookies", "netscape"],
        message: MSG_COOKIE_FORMAT,
    },
    Rule {
        needles: &["unavailable"],
        message: MSG_UNAVAILABLE,
    },
];

/// Classify a raw extractor error string into a user-facing message.
///
/// Matching is case-insensitive substring containment; a rule with multiple
/// needles requires all of them. Unmatched text yields
/// `"Download failed: <raw>"`.
///
/// # Examples
///
/// ```
/// use tube_dl::classify::{classify_extractor_error, MSG_AGE_RESTRICTED};
///
/// let msg = classify_extractor_error("ERROR: Age restricted video");
/// assert_eq!(msg, MSG_AGE_RESTRICTED);
/// ```
pub fn classify_extractor_error(raw: &str) -> String {
    let haystack = raw.to_lowercase();

    for rule in RULES {
        if rule.needles.iter().all(|needle| haystack.contains(needle)) {
            return rule.message.to_string();
        }
    }

    format!("Download failed: {raw}")
}
