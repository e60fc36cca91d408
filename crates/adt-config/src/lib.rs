//! Configuration for the `adt` CLI.
//!
//! TOML accounts, credential resolution (env + keyring + plaintext),
//! and translation to `adt_core::AdtConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adt_core::{AdtConfig, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "adt";

/// Environment variable consulted for the password when an account
/// names none of its own.
pub const PASSWORD_ENV: &str = "ADT_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("account '{account}' is not configured")]
    UnknownAccount { account: String },

    #[error("no {what} configured for account '{account}'")]
    NoCredentials { account: String, what: &'static str },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Account used when none is named on the command line.
    pub default_account: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named panel accounts.
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_account: Some("default".into()),
            defaults: Defaults::default(),
            accounts: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up an account, falling back to `default_account`.
    pub fn account(&self, name: Option<&str>) -> Result<(&str, &Account), ConfigError> {
        let name = name
            .or(self.default_account.as_deref())
            .unwrap_or("default");
        self.accounts
            .get_key_value(name)
            .map(|(name, account)| (name.as_str(), account))
            .ok_or_else(|| ConfigError::UnknownAccount {
                account: name.into(),
            })
    }
}

/// Global defaults, all timings in seconds.
#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    #[serde(default = "default_target_state_timeout")]
    pub target_state_timeout: u64,

    #[serde(default = "default_recovery_backoff")]
    pub recovery_backoff: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            cache_ttl: default_cache_ttl(),
            target_state_timeout: default_target_state_timeout(),
            recovery_backoff: default_recovery_backoff(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_cache_ttl() -> u64 {
    5
}
fn default_target_state_timeout() -> u64 {
    20
}
fn default_recovery_backoff() -> u64 {
    3
}

/// A named panel account.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Account {
    /// Portal host (e.g. "smartsecurity.adt.com.ar") or base URL.
    pub domain: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Override the cache TTL (seconds).
    pub cache_ttl: Option<u64>,

    /// Override the request timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "adt", "adt").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("adt");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn file_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

/// Load the config at `path`, layered with `ADT_*` environment
/// variables (`__` separates nested keys: `ADT_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = file_figment(path)
        .merge(Env::prefixed("ADT_").split("__"))
        .extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(account_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{account_name}/password"),
    )?)
}

/// Store an account password in the system keyring.
pub fn store_password(account_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(account_name)?.set_password(password.expose_secret())?;
    Ok(())
}

/// Resolve the username: config first, then `ADT_USERNAME`.
pub fn resolve_username(account: &Account, account_name: &str) -> Result<String, ConfigError> {
    account
        .username
        .clone()
        .or_else(|| std::env::var("ADT_USERNAME").ok())
        .filter(|username| !username.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            account: account_name.into(),
            what: "username",
        })
}

/// Resolve the password: env var, then system keyring, then plaintext.
pub fn resolve_password(
    account: &Account,
    account_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Env var
    let env_name = account.password_env.as_deref().unwrap_or(PASSWORD_ENV);
    if let Ok(pw) = std::env::var(env_name) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(account_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = account.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        account: account_name.into(),
        what: "password",
    })
}

// ── Translation to core config ──────────────────────────────────────

/// Build an `AdtConfig` for an account with explicit credentials.
pub fn build_adt_config(
    account: &Account,
    defaults: &Defaults,
    username: String,
    password: SecretString,
) -> Result<AdtConfig, ConfigError> {
    if account.domain.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "domain".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut config = AdtConfig::new(username, password, account.domain.clone());
    config.cache_ttl = Duration::from_secs(account.cache_ttl.unwrap_or(defaults.cache_ttl));
    config.timeout = Duration::from_secs(account.timeout.unwrap_or(defaults.timeout));
    config.target_state_timeout = Duration::from_secs(defaults.target_state_timeout);
    config.recovery_backoff = Duration::from_secs(defaults.recovery_backoff);
    config.tls = if account.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = account.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    Ok(config)
}
