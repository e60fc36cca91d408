//! `adt arm` and `adt disarm`

use tracing::debug;

use adt_core::{AdtClient, ArmingMode, ArmingState};

use crate::cli::{ArmArgs, ArmTarget, GlobalOpts, WaitArgs};
use crate::error::CliError;
use crate::output;

impl From<ArmTarget> for ArmingMode {
    fn from(target: ArmTarget) -> Self {
        match target {
            ArmTarget::Home => ArmingMode::Home,
            ArmTarget::Away => ArmingMode::Away,
        }
    }
}

pub async fn arm(client: &AdtClient, args: ArmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    change(client, args.mode.into(), args.wait.wait, global).await
}

pub async fn disarm(
    client: &AdtClient,
    args: WaitArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    change(client, ArmingMode::Disarmed, args.wait, global).await
}

async fn change(
    client: &AdtClient,
    mode: ArmingMode,
    wait: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let target = ArmingState::from(mode);
    let color = output::should_color(&global.color);

    // Subscribe before submitting so the confirming scrape is not missed.
    let mut updates = client.subscribe();
    client.change_state(mode).await?;
    debug!(%target, "arming command accepted");

    if !wait {
        output::print_output(
            &format!("Requested {}", output::arming_label(target, color)),
            global.quiet,
        );
        return Ok(());
    }

    let confirmed = async {
        if client
            .try_state()
            .is_some_and(|state| state.arming_state == target)
        {
            return;
        }
        while let Some(state) = updates.next().await {
            if state.arming_state == target {
                return;
            }
        }
    };

    tokio::time::timeout(client.config().target_state_timeout, confirmed)
        .await
        .map_err(|_| CliError::Unconfirmed {
            target: target.to_string(),
        })?;

    output::print_output(
        &format!("Panel is {}", output::arming_label(target, color)),
        global.quiet,
    );
    Ok(())
}
