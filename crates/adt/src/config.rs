//! Resolves global flags and the config file into an `AdtConfig`.
//!
//! Precedence for every field: flag > env var > account > defaults.

use std::time::Duration;

use secrecy::SecretString;

use adt_config::{Account, Config, ConfigError, Defaults};
use adt_core::{AdtConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build the core config for a portal-bound command.
pub fn resolve_adt_config(global: &GlobalOpts) -> Result<AdtConfig, CliError> {
    let cfg = adt_config::load_config()?;

    match cfg.account(global.account.as_deref()) {
        Ok((name, account)) => resolve_account(name, account, &cfg.defaults, global),
        Err(ConfigError::UnknownAccount { account }) if global.account.is_some() => {
            Err(account_not_found(&cfg, account))
        }
        Err(_) => resolve_from_flags(&cfg.defaults, global),
    }
}

fn account_not_found(cfg: &Config, name: String) -> CliError {
    let available = if cfg.accounts.is_empty() {
        "(none)".to_owned()
    } else {
        cfg.accounts.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    CliError::AccountNotFound { name, available }
}

fn resolve_account(
    name: &str,
    account: &Account,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<AdtConfig, CliError> {
    let username = match global.username {
        Some(ref username) => username.clone(),
        None => adt_config::resolve_username(account, name)?,
    };
    let password = match global.password {
        Some(ref password) => SecretString::from(password.clone()),
        None => adt_config::resolve_password(account, name)?,
    };

    let mut config = adt_config::build_adt_config(account, defaults, username, password)?;
    apply_overrides(&mut config, global);
    Ok(config)
}

/// No account on disk: everything must come from flags or `ADT_*` vars.
fn resolve_from_flags(defaults: &Defaults, global: &GlobalOpts) -> Result<AdtConfig, CliError> {
    let domain = global.domain.clone().ok_or_else(|| CliError::NoConfig {
        path: adt_config::config_path().display().to_string(),
    })?;
    let username = global.username.clone().ok_or_else(|| CliError::NoCredentials {
        account: "(flags)".into(),
        what: "username",
    })?;
    let password = global.password.clone().ok_or_else(|| CliError::NoCredentials {
        account: "(flags)".into(),
        what: "password",
    })?;

    let account = Account {
        domain,
        ..Account::default()
    };
    let mut config = adt_config::build_adt_config(
        &account,
        defaults,
        username,
        SecretString::from(password),
    )?;
    apply_overrides(&mut config, global);
    Ok(config)
}

fn apply_overrides(config: &mut AdtConfig, global: &GlobalOpts) {
    if let Some(ref domain) = global.domain {
        config.domain.clone_from(domain);
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
}
