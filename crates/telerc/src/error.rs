//! CLI error types with miette diagnostics.
//!
//! Maps engine and config failures into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_PAIRED: i32 = 3;
    pub const NO_TARGET: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("no TV configured")]
    #[diagnostic(
        code(telerc::no_target),
        help("Add one with: telerc tv add <name> <address> [--mac AA:BB:CC:DD:EE:FF]")
    )]
    NoTarget,

    #[error("no TV named '{name}' in the configuration")]
    #[diagnostic(code(telerc::unknown_tv), help("List configured TVs with: telerc tv list"))]
    UnknownTv { name: String },

    #[error("not paired with the TV yet")]
    #[diagnostic(
        code(telerc::not_paired),
        help("Run: telerc pair <address> — the TV will display a PIN to confirm")
    )]
    NotPaired,

    #[error("pairing failed: {message}")]
    #[diagnostic(
        code(telerc::pairing_failed),
        help("Check that the TV is on, reachable, and that remote pairing is enabled.")
    )]
    PairingFailed { message: String },

    #[error("connection failed: {message}")]
    #[diagnostic(
        code(telerc::connection_failed),
        help("Check that the TV is on and reachable on the network.")
    )]
    ConnectionFailed { message: String },

    #[error("invalid {field}: {reason}")]
    #[diagnostic(code(telerc::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(telerc::config))]
    Config(#[from] telerc_config::ConfigError),

    #[error(transparent)]
    #[diagnostic(code(telerc::core))]
    Core(#[from] telerc_core::CoreError),

    #[error("{0}")]
    #[diagnostic(code(telerc::other))]
    Other(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoTarget | Self::UnknownTv { .. } => exit_code::NO_TARGET,
            Self::NotPaired | Self::PairingFailed { .. } => exit_code::NOT_PAIRED,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(telerc_config::ConfigError::NoTvConfigured) => exit_code::NO_TARGET,
            Self::Config(telerc_config::ConfigError::UnknownTv { .. }) => exit_code::NO_TARGET,
            _ => exit_code::GENERAL,
        }
    }
}
