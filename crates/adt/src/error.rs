//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use adt_config::ConfigError;
use adt_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the portal: {reason}")]
    #[diagnostic(
        code(adt::connection_failed),
        help(
            "Check the domain and your network connection.\n\
             Run with -vv to see each request."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Panel state not available after {seconds}s")]
    #[diagnostic(
        code(adt::timeout),
        help("The portal did not produce a readable dashboard in time. Run with -v to see retries.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(adt::auth_failed),
        help(
            "Verify the username and password you use on the self-care portal.\n\
             Store a new password with: adt config init --keyring --password <PASSWORD>"
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for account '{account}'")]
    #[diagnostic(
        code(adt::no_credentials),
        help(
            "Pass --{what} or set ADT_USERNAME / ADT_PASSWORD.\n\
             To save it: adt config init --name {account} --keyring"
        )
    )]
    NoCredentials { account: String, what: &'static str },

    // ── Panel ────────────────────────────────────────────────────────
    #[error("Panel is not ready to arm")]
    #[diagnostic(
        code(adt::not_ready),
        help("Close all doors and windows, then try again. Disarming is always allowed.")
    )]
    NotReady,

    #[error("The dashboard could not be read: {message}")]
    #[diagnostic(
        code(adt::dashboard),
        help("The portal layout may have changed. Run with -vv and report the output.")
    )]
    Dashboard { message: String },

    #[error("Panel did not reach {target} in time")]
    #[diagnostic(
        code(adt::unconfirmed),
        help("The command was accepted; check `adt status` in a few seconds.")
    )]
    Unconfirmed { target: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adt::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Account '{name}' not found in configuration")]
    #[diagnostic(
        code(adt::account_not_found),
        help(
            "Available accounts: {available}\n\
             Create one with: adt config init --name {name} --domain <HOST> --username <USER>"
        )
    )]
    AccountNotFound { name: String, available: String },

    #[error("No account configured")]
    #[diagnostic(
        code(adt::no_config),
        help(
            "Create one with: adt config init --domain <HOST> --username <USER>\n\
             Or pass --domain and --username.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(adt::config))]
    Config(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(adt::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(adt::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } | Self::Unconfirmed { .. } => exit_code::TIMEOUT,
            Self::NotReady => exit_code::REJECTED,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::AccountNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Network { message } => CliError::ConnectionFailed { reason: message },
            CoreError::SessionExpired => CliError::ConnectionFailed {
                reason: "portal session expired".into(),
            },
            CoreError::ClientClosed => CliError::ConnectionFailed {
                reason: "client disconnected".into(),
            },
            e @ (CoreError::UnrecognizedState { .. } | CoreError::MissingActionHandles { .. }) => {
                CliError::Dashboard {
                    message: e.to_string(),
                }
            }
            CoreError::NotReady => CliError::NotReady,
            CoreError::UnsupportedMode { code } => CliError::Validation {
                field: "mode".into(),
                reason: format!("unsupported arming mode code {code}"),
            },
            CoreError::StateUnavailable { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { account, what } => {
                CliError::NoCredentials { account, what }
            }
            ConfigError::UnknownAccount { account } => CliError::AccountNotFound {
                name: account,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}
