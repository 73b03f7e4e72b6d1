// ── Core error types ──
//
// User-facing errors from telerc-core. Consumers never see raw socket
// or TLS failures directly: transport errors either funnel through the
// central classifier into a `SessionStatus` transition, or — for the
// few fallible entry points — surface as one of these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Target errors ────────────────────────────────────────────────
    #[error("no target device configured")]
    NoTarget,

    // ── Credential errors ────────────────────────────────────────────
    #[error("credential store error: {0}")]
    CredentialStore(String),

    // ── Wake errors ──────────────────────────────────────────────────
    #[error("invalid hardware address '{address}'")]
    InvalidHardwareAddress { address: String },

    #[error("wake packet send failed: {0}")]
    WakeSend(#[from] std::io::Error),

    // ── Transport (wrapped, not exposed raw) ─────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<telerc_api::Error> for CoreError {
    fn from(err: telerc_api::Error) -> Self {
        CoreError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_classifiable_message() {
        let api = telerc_api::Error::Pairing {
            message: "secret mismatch".into(),
        };
        let core = CoreError::from(api);
        assert!(core.to_string().contains("Pairing Error"));
    }
}
