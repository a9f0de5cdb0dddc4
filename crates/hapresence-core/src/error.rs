// ── Core error types ──
//
// User-facing failures from hapresence-core. These are deliberately
// terse: transport error text, exception detail, and full URLs go to
// the tracing log, never into these messages. The `From` impl below is
// the single place where transport failures get classified.

use thiserror::Error;

/// Failure taxonomy shared by the presence fetch and the prober.
///
/// None of these are retried — a failed fetch is simply not cached, so
/// the next call retries naturally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// URL or token missing — checked before any network attempt.
    #[error("Home Assistant is not configured")]
    NotConfigured,

    /// Home Assistant answered with a status other than 200.
    #[error("Failed to fetch data: HTTP {status}")]
    Upstream { status: u16 },

    /// Body was not the expected JSON shape.
    #[error("Invalid response from Home Assistant")]
    InvalidResponse,

    /// The local-destination policy refused the target. The message is
    /// actionable: the admin can explicitly allow local destinations.
    #[error(
        "Cannot connect to a local server. If your Home Assistant is on a local network, \
         set the 'ha_allow_local' option to 1 to allow local destinations."
    )]
    LocalDestinationBlocked,

    /// Any other transport/protocol failure (DNS, refused, TLS, timeout).
    #[error("Could not connect to Home Assistant. Please check your settings.")]
    ConnectionFailed,
}

impl From<hapresence_api::Error> for PresenceError {
    fn from(err: hapresence_api::Error) -> Self {
        use hapresence_api::Error as Api;
        match err {
            Api::Status { status } => Self::Upstream { status },
            Api::Deserialization { .. } => Self::InvalidResponse,
            Api::LocalAddressBlocked { .. } => Self::LocalDestinationBlocked,
            Api::Transport(_) | Api::InvalidUrl(_) | Api::Timeout | Api::Tls(_) => {
                Self::ConnectionFailed
            }
        }
    }
}

/// Failures of the settings read/write path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Settings writes are restricted to administrators.
    #[error("Only administrators may change Home Assistant settings")]
    Forbidden,

    /// A submitted value was rejected.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_collapse_to_generic_connection_failure() {
        let err = PresenceError::from(hapresence_api::Error::Tls("handshake".into()));
        assert_eq!(err, PresenceError::ConnectionFailed);
        // The generic message never carries transport detail.
        assert!(!err.to_string().contains("handshake"));

        assert_eq!(
            PresenceError::from(hapresence_api::Error::Timeout),
            PresenceError::ConnectionFailed
        );
    }

    #[test]
    fn local_block_is_distinct_from_generic_failure() {
        let blocked = PresenceError::from(hapresence_api::Error::LocalAddressBlocked {
            host: "192.168.1.20".into(),
        });
        assert_eq!(blocked, PresenceError::LocalDestinationBlocked);
        assert_ne!(
            blocked.to_string(),
            PresenceError::ConnectionFailed.to_string()
        );
        assert!(blocked.to_string().contains("ha_allow_local"));
    }

    #[test]
    fn upstream_message_embeds_the_status_code() {
        assert!(
            PresenceError::Upstream { status: 503 }
                .to_string()
                .contains("503")
        );
    }
}
