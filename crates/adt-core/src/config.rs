// ── Runtime client configuration ──
//
// Describes *how* to reach the portal: credentials plus timing knobs.
// Never touches disk; the CLI (or any other host) builds an `AdtConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Only useful against test doubles.
    DangerAcceptInvalid,
}

/// Configuration for one panel account.
#[derive(Debug, Clone)]
pub struct AdtConfig {
    pub username: String,
    pub password: SecretString,
    /// Portal host (`smartsecurity.adt.com.ar`) or full base URL.
    pub domain: String,
    /// How long a scraped state stays fresh before a refresh is triggered.
    pub cache_ttl: Duration,
    /// How long a requested arming mode masks the scraped one.
    pub target_state_timeout: Duration,
    /// Pause between recovery attempts.
    pub recovery_backoff: Duration,
    /// How long `get_state` waits for the first scrape.
    pub cold_start_timeout: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub tls: TlsVerification,
}

impl AdtConfig {
    /// Config with the default timings.
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            domain: domain.into(),
            cache_ttl: Duration::from_secs(5),
            target_state_timeout: Duration::from_secs(20),
            recovery_backoff: Duration::from_secs(3),
            cold_start_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            tls: TlsVerification::default(),
        }
    }

    /// Check that credentials and domain are present.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("username", self.username.trim().is_empty()),
            ("password", self.password.expose_secret().is_empty()),
            ("domain", self.domain.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config {
                message: format!("missing {}", missing.join(", ")),
            })
        }
    }

    /// The portal base URL. A bare host is served over HTTPS.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        let domain = self.domain.trim();
        let raw = if domain.contains("://") {
            domain.to_owned()
        } else {
            format!("https://{domain}")
        };
        Url::parse(&raw).map_err(|e| CoreError::Config {
            message: format!("invalid domain '{domain}': {e}"),
        })
    }
}
