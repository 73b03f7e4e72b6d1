//! Connection and pairing lifecycle engine for TV remote control.
//!
//! This crate owns the hardest part of the system: a concurrent state
//! machine reconciling unreliable external dependencies — the network,
//! the TLS pairing handshake, operator PIN entry and a persisted
//! credential store — into one consistent, observable status.
//!
//! - **[`RemoteEngine`]** — Central facade. Give it a
//!   [`TargetDevice`] and it drives the whole lifecycle: credential
//!   gate, Wake-on-LAN, pairing with PIN confirmation, the operational
//!   session, and classified recovery from every failure.
//! - **[`SessionStatus`]** — The single source of truth for observable
//!   state, reachable only through named transitions on the engine's
//!   status cell and broadcast over a `watch` channel.
//! - **[`classify`]** — Central error classification: every raw
//!   transport or handshake failure funnels through one decision point
//!   that picks the recovery action (credential reset + re-pair, PIN
//!   re-prompt, reachability hint, or plain error).
//! - **[`CredentialStore`] / [`TargetStore`]** — Injected persistence
//!   seams. No ambient globals; tests run against the in-memory
//!   implementations.
//! - **[`WakeService`]** — Best-effort magic-packet wake-up sequenced
//!   before connection attempts.
//!
//! The wire protocol lives in `telerc-api`; configuration loading in
//! `telerc-config`.

pub mod classify;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod status;
pub mod store;
pub mod target;
pub mod wake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{ErrorClass, classify};
pub use config::{AttemptOrigin, EngineConfig};
pub use credentials::{CredentialStore, FsCredentialStore, MemoryCredentialStore};
pub use engine::RemoteEngine;
pub use error::CoreError;
pub use status::SessionStatus;
pub use store::{MemoryTargetStore, TargetStore};
pub use target::TargetDevice;
pub use wake::WakeService;

// Re-export the api types consumers need to drive the engine.
pub use telerc_api::{KeyCode, KeyDirection, RemoteClient, RemoteTransport, TransportConfig};
