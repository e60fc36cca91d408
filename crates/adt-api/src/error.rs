use thiserror::Error;

/// Top-level error type for the `adt-api` crate.
///
/// Covers every failure mode of the self-care portal exchange:
/// authentication, transport, and dashboard parsing.
/// `adt-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed. The portal re-renders the login page on bad
    /// credentials instead of answering with an HTTP error, so this is
    /// usually detected by the CSRF token not rotating.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session cookie expired or was revoked by the portal.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// A page that must carry a `_csrf` hidden input did not.
    #[error("No CSRF token found on the {page} page")]
    MissingCsrfToken { page: &'static str },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status unrelated to authentication.
    #[error("HTTP {status} from {path}")]
    Http { status: u16, path: String },

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Dashboard ───────────────────────────────────────────────────
    /// The dashboard did not show any arming state we know how to read.
    #[error("Unrecognized panel state: {detail}")]
    UnrecognizedState { detail: String },

    /// One or more of the tokens needed to submit a command were absent.
    #[error("Dashboard is missing action handles: {}", missing.join(", "))]
    MissingActionHandles { missing: Vec<&'static str> },
}
