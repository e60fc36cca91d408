//! `adt watch`: print every published state until interrupted.

use adt_core::{AdtClient, SystemState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

fn render(state: &SystemState, global: &GlobalOpts, color: bool) -> Result<String, CliError> {
    // One document per line for machine formats.
    let format = match global.output {
        OutputFormat::Json => OutputFormat::JsonCompact,
        ref other => other.clone(),
    };
    output::render_single(
        &format,
        state,
        |s| output::state_line(s, color),
        |s| s.arming_state.to_string(),
    )
}

pub async fn handle(
    client: &AdtClient,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let limit = args.count.unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(());
    }

    let mut updates = client.subscribe();
    let current = client.get_state().await?;
    output::print_output(&render(&current, global, color)?, global.quiet);
    let mut printed = 1;

    while printed < limit {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.next() => {
                let Some(state) = update else { break };
                output::print_output(&render(&state, global, color)?, global.quiet);
                printed += 1;
            }
        }
    }
    Ok(())
}
