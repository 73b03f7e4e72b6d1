//! Protocol client for TLS-secured TV remote control.
//!
//! This crate owns everything that touches the wire:
//!
//! - **[`RemoteClient`]** — the protocol client. Opens one leg at a time
//!   (pairing handshake on port 6467 or operational session on port 6466),
//!   translates the stream into [`TransportEvent`]s, and exposes
//!   `send_secret` / `send_key` for the live leg.
//! - **[`RemoteTransport`]** — the trait seam `telerc-core` drives;
//!   tests substitute scripted fakes.
//! - **[`ClientIdentity`]** — the self-signed certificate + key whose
//!   persisted PEM bundle is the credential artifact proving a pairing
//!   completed.
//! - **[`wire`]** — varint-length-prefixed bincode frames and the
//!   pairing/session message sets.
//! - **[`KeyCode`]** — the remote-control command surface.
//!
//! The engine that sequences wake-up, pairing, reconnection and command
//! gating lives in `telerc-core`; this crate deliberately knows nothing
//! about retry policy or user-facing status.

pub mod error;
pub mod identity;
pub mod keycode;
pub mod remote;
pub mod transport;
pub mod wire;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::Error;
pub use identity::{ClientIdentity, secret_digest};
pub use keycode::{KeyCode, KeyDirection, UnknownKey};
pub use remote::{ConnectLeg, RemoteClient, RemoteTransport, TransportEvent};
pub use transport::TransportConfig;
