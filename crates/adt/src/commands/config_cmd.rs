//! Config subcommand handlers.

use secrecy::SecretString;

use adt_config::{Account, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init) => init_account(init, global),

        ConfigCommand::Show => {
            let mut cfg = adt_config::load_config()?;
            redact(&mut cfg);
            let rendered = toml::to_string_pretty(&cfg).map_err(|e| CliError::Config(e.to_string()))?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &adt_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }
    }
}

fn redact(cfg: &mut Config) {
    for account in cfg.accounts.values_mut() {
        if account.password.is_some() {
            account.password = Some(REDACTED.into());
        }
    }
}

fn init_account(args: InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let domain = global.domain.clone().ok_or_else(|| CliError::Validation {
        field: "domain".into(),
        reason: "pass --domain with the portal host".into(),
    })?;

    let mut cfg = adt_config::load_config_or_default();
    if cfg.accounts.contains_key(&args.name) && !args.force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("account '{}' already exists (use --force to replace it)", args.name),
        });
    }

    let mut account = Account {
        domain,
        username: global.username.clone(),
        insecure: global.insecure,
        timeout: global.timeout,
        ..Account::default()
    };

    match (args.keyring, global.password.as_ref()) {
        (true, Some(password)) => {
            adt_config::store_password(&args.name, &SecretString::from(password.clone()))?;
            eprintln!("Password stored in system keyring");
        }
        (true, None) => {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "--keyring needs --password or ADT_PASSWORD".into(),
            });
        }
        (false, Some(password)) => account.password = Some(password.clone()),
        (false, None) => {}
    }

    if cfg.default_account.is_none() || cfg.accounts.is_empty() {
        cfg.default_account = Some(args.name.clone());
    }
    cfg.accounts.insert(args.name.clone(), account);
    adt_config::save_config(&cfg)?;

    output::print_output(
        &format!(
            "Saved account '{}' to {}",
            args.name,
            adt_config::config_path().display()
        ),
        global.quiet,
    );
    Ok(())
}
