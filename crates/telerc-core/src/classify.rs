//! Central error classification.
//!
//! Every raw transport or handshake failure funnels through
//! [`classify`] before it may touch the session status — one decision
//! point for the whole engine, keyed on the message text because the
//! underlying failures cross TLS, socket and protocol layers that do
//! not share a type.

/// Recovery-relevant class of a raw error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// TLS / certificate / trust-anchor problem: the stored credential
    /// is no longer usable. Recover by credential reset + re-pairing.
    Trust,
    /// PIN mismatch or secret-exchange failure: the credential is fine,
    /// the operator mistyped. Recover by re-prompting for the PIN.
    Secret,
    /// Operator submitted an empty PIN; rejected before any network call.
    EmptyPin,
    /// The TV cannot be reached (off, asleep, wrong network).
    Unreachable,
    /// Anything else: surfaced as a truncated connection error.
    Generic,
}

const TRUST_KEYWORDS: &[&str] = &["ssl", "certificate", "eacces", "trust anchor"];

const SECRET_KEYWORDS: &[&str] = &[
    "pairing error",
    "secret incorrect",
    "pin verification failed",
    "pairing failed",
    "badpaddingexception",
];

const EMPTY_PIN_KEYWORD: &str = "le pin ne peut pas être vide";

const UNREACHABLE_KEYWORDS: &[&str] = &[
    "failed to connect",
    "timeout",
    "timed out",
    "etimedout",
    "econnrefused",
    "connection refused",
    "no route to host",
    "ehostunreach",
    "host unreachable",
    "network unreachable",
];

/// Classify a raw error message.
///
/// Precedence matters: trust failures win over secret failures (a TLS
/// alert during the secret exchange must reset the credential, not
/// re-prompt), and both win over reachability.
pub fn classify(raw: &str) -> ErrorClass {
    let lowered = raw.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if contains_any(TRUST_KEYWORDS) {
        ErrorClass::Trust
    } else if contains_any(SECRET_KEYWORDS) {
        ErrorClass::Secret
    } else if lowered.contains(EMPTY_PIN_KEYWORD) {
        ErrorClass::EmptyPin
    } else if contains_any(UNREACHABLE_KEYWORDS) {
        ErrorClass::Unreachable
    } else {
        ErrorClass::Generic
    }
}

/// First line of a raw error, truncated for display.
pub(crate) fn concise(raw: &str, max: usize) -> String {
    let first_line = raw.lines().next().unwrap_or(raw);
    first_line.chars().take(max).collect()
}
