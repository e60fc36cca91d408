// ── Core error types ──
//
// User-facing errors from adt-core. Consumers never see reqwest errors
// or selector failures directly; the `From<adt_api::Error>` impl folds
// the portal taxonomy into the handful of cases a caller can act on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot reach the portal: {message}")]
    Network { message: String },

    #[error("Portal session expired")]
    SessionExpired,

    // ── Scrape errors ────────────────────────────────────────────────
    #[error("Unrecognized panel state: {detail}")]
    UnrecognizedState { detail: String },

    #[error("Dashboard is missing action handles: {}", missing.join(", "))]
    MissingActionHandles { missing: Vec<&'static str> },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Panel is not ready to arm; close all doors and windows or disarm")]
    NotReady,

    #[error("Unsupported arming mode: {code} (expected 0 = home, 1 = away, 3 = disarmed)")]
    UnsupportedMode { code: u8 },

    // ── Client errors ────────────────────────────────────────────────
    #[error("Panel state not available after {timeout_secs}s")]
    StateUnavailable { timeout_secs: u64 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Client has been disconnected")]
    ClientClosed,
}

impl CoreError {
    /// The portal no longer honours the session; a fresh login is needed.
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthenticationFailed { .. })
    }

    /// Scrape failures that should hand over to the recovery loop.
    pub fn is_scrape_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::SessionExpired
                | Self::AuthenticationFailed { .. }
                | Self::UnrecognizedState { .. }
                | Self::MissingActionHandles { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<adt_api::Error> for CoreError {
    fn from(err: adt_api::Error) -> Self {
        match err {
            adt_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            adt_api::Error::SessionExpired => CoreError::SessionExpired,
            adt_api::Error::MissingCsrfToken { page } => CoreError::Network {
                message: format!("portal did not issue a CSRF token on the {page} page"),
            },
            adt_api::Error::Transport(e) => CoreError::Network {
                message: if e.is_timeout() {
                    "request timed out".into()
                } else {
                    e.to_string()
                },
            },
            adt_api::Error::Http { status, path } => CoreError::Network {
                message: format!("HTTP {status} from {path}"),
            },
            adt_api::Error::Tls(msg) => CoreError::Network {
                message: format!("TLS error: {msg}"),
            },
            adt_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            adt_api::Error::UnrecognizedState { detail } => CoreError::UnrecognizedState { detail },
            adt_api::Error::MissingActionHandles { missing } => {
                CoreError::MissingActionHandles { missing }
            }
        }
    }
}
