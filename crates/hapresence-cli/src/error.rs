//! CLI error types with miette diagnostics.
//!
//! Maps the core failure taxonomy into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hapresence_core::{PresenceError, SettingsError};

/// Exit codes for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_CONFIGURED: i32 = 3;
    pub const FORBIDDEN: i32 = 5;
    pub const UPSTREAM: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Home Assistant is not configured")]
    #[diagnostic(
        code(hapresence::not_configured),
        help(
            "Set the base URL and a long-lived access token:\n\
             \x20 hapresence config set ha_url http://homeassistant.example:8123\n\
             \x20 hapresence config set ha_token <token>"
        )
    )]
    NotConfigured,

    #[error("Config file error: {message}")]
    #[diagnostic(code(hapresence::config))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(code(hapresence::settings))]
    Settings(#[from] SettingsError),

    // ── Remote failures ──────────────────────────────────────────────
    #[error("Home Assistant returned HTTP {status}")]
    #[diagnostic(
        code(hapresence::upstream),
        help("The server answered but refused the request. 401/403 usually mean a bad token.")
    )]
    Upstream { status: u16 },

    #[error("Invalid response from Home Assistant")]
    #[diagnostic(
        code(hapresence::invalid_response),
        help("The configured URL answers, but not with the Home Assistant API. Check ha_url.")
    )]
    InvalidResponse,

    #[error("{0}")]
    #[diagnostic(
        code(hapresence::local_blocked),
        help("Run `hapresence config set ha_allow_local 1` to allow local destinations.")
    )]
    LocalBlocked(String),

    #[error("Could not connect to Home Assistant")]
    #[diagnostic(
        code(hapresence::connection_failed),
        help(
            "Check that the URL is correct and the server is running and accessible.\n\
             Try: hapresence test -v"
        )
    )]
    ConnectionFailed,

    /// The connectivity probe reported failure; the message is already
    /// user-facing.
    #[error("{message}")]
    #[diagnostic(code(hapresence::probe_failed))]
    ProbeFailed { message: String },

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(hapresence::output))]
    Serialize(#[from] serde_json::Error),
}

impl From<PresenceError> for CliError {
    fn from(err: PresenceError) -> Self {
        match err {
            PresenceError::NotConfigured => Self::NotConfigured,
            PresenceError::Upstream { status } => Self::Upstream { status },
            PresenceError::InvalidResponse => Self::InvalidResponse,
            PresenceError::LocalDestinationBlocked => Self::LocalBlocked(err.to_string()),
            PresenceError::ConnectionFailed => Self::ConnectionFailed,
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotConfigured => exit_code::NOT_CONFIGURED,
            Self::Config { .. } => exit_code::USAGE,
            Self::Settings(SettingsError::Forbidden) => exit_code::FORBIDDEN,
            Self::Settings(_) => exit_code::USAGE,
            Self::Upstream { .. } => exit_code::UPSTREAM,
            Self::InvalidResponse
            | Self::LocalBlocked(_)
            | Self::ConnectionFailed
            | Self::ProbeFailed { .. } => exit_code::CONNECTION,
            Self::Serialize(_) => exit_code::GENERAL,
        }
    }
}
