use thiserror::Error;

/// Top-level error type for the `hapresence-api` crate.
///
/// Covers every failure mode of the transport layer: request building,
/// connection/TLS problems, unexpected upstream status codes, and
/// undecodable payloads. `hapresence-core` maps these into the
/// user-facing failure taxonomy — callers never surface these raw.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Outbound request refused because the target resolves to a
    /// local/private address and local destinations are not allowed.
    #[error("Destination {host} is a local address and local destinations are not allowed")]
    LocalAddressBlocked { host: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// Home Assistant answered with a status other than 200.
    #[error("Home Assistant returned HTTP {status}")]
    Status { status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Classify a `reqwest` failure, splitting timeouts out of the
    /// generic transport bucket.
    pub(crate) fn request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}
