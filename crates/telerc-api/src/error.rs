use thiserror::Error;

/// Top-level error type for the `telerc-api` crate.
///
/// Covers every failure mode of the protocol client: identity material,
/// TLS, socket I/O, framing, and the pairing handshake itself.
/// `telerc-core` maps these into user-facing status transitions — the
/// `Display` strings therefore keep the tokens its classifier keys on
/// ("certificate", "SSL", "Pairing Error", the OS reachability messages
/// passed through from [`std::io::Error`]).
#[derive(Debug, Error)]
pub enum Error {
    // ── Identity ────────────────────────────────────────────────────
    /// Generating a fresh client identity failed.
    #[error("certificate generation failed: {0}")]
    IdentityGeneration(String),

    /// The persisted identity bundle could not be parsed.
    #[error("invalid client certificate bundle: {0}")]
    IdentityParse(String),

    // ── Transport ───────────────────────────────────────────────────
    /// TLS configuration or handshake error.
    #[error("SSL error: {0}")]
    Tls(String),

    /// Socket-level error (connect refused, reset, timeout...).
    /// The OS message is preserved verbatim for classification.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The address could not be used as a TLS server name.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    // ── Framing ─────────────────────────────────────────────────────
    /// A frame exceeded the protocol's size cap or had a corrupt header.
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    /// Payload encoding or decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    // ── Pairing / session ───────────────────────────────────────────
    /// The TV rejected the pairing handshake.
    #[error("Pairing Error: {message}")]
    Pairing { message: String },

    /// An operation required a live leg but none is open.
    #[error("not connected")]
    NotConnected,

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,
}

impl Error {
    /// `true` when retrying the same operation may succeed
    /// (reachability-class failures).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::HostUnreachable
                    | std::io::ErrorKind::NetworkUnreachable
            ),
            Self::Closed => true,
            _ => false,
        }
    }

    /// `true` when the failure invalidates the stored credential
    /// (TLS trust problems).
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, Self::Tls(_) | Self::IdentityParse(_))
    }
}
