// ── Core error types ──
//
// Errors surfaced by the reconciliation engine. Consumers never see HTTP
// status codes or JSON parse failures directly: the
// `From<streamcord_api::Error>` impl folds transport failures into the
// upstream taxonomy, and the Discord directory maps its own failures
// explicitly so they stay attributable to one resource.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Upstream (media server) ──────────────────────────────────────
    /// The media server could not be queried at all. Aborts the cycle.
    #[error("Media server unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// One upstream record could not be interpreted. Skipped, never fatal.
    #[error("Malformed {record} record: {reason}")]
    UpstreamRecordMalformed { record: String, reason: String },

    // ── Chat directory ───────────────────────────────────────────────
    /// A single create/update/delete against the chat platform failed.
    #[error("Chat operation on {key} failed: {reason}")]
    ChatOperationFailed { key: String, reason: String },

    /// The resource a held handle points at no longer exists.
    #[error("Chat resource {key} no longer exists")]
    ChatResourceMissing { key: String },

    /// Managed resources could not be listed. Aborts the cycle.
    #[error("Chat directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {message}")]
    ConfigurationInvalid { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the next cycle should be attempted after the short backoff.
    pub fn is_cycle_level(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::DirectoryUnavailable { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<streamcord_api::Error> for CoreError {
    fn from(err: streamcord_api::Error) -> Self {
        use streamcord_api::Error as ApiError;

        match err {
            ApiError::InvalidUrl(e) => CoreError::ConfigurationInvalid {
                message: format!("invalid URL: {e}"),
            },
            ApiError::Authentication { message } => CoreError::UpstreamUnavailable {
                reason: format!("authentication rejected: {message}"),
            },
            ApiError::Deserialization { message, .. } => CoreError::UpstreamUnavailable {
                reason: format!("unreadable response: {message}"),
            },
            other => CoreError::UpstreamUnavailable {
                reason: other.to_string(),
            },
        }
    }
}
