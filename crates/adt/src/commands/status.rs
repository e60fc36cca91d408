//! `adt status`

use adt_core::AdtClient;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &AdtClient,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = client.get_state().await?;
    let color = output::should_color(&global.color);

    let rendered = match args.sensor {
        Some(name) => {
            let sensor = state
                .contact_sensor(&name)
                .ok_or_else(|| CliError::Validation {
                    field: "sensor".into(),
                    reason: format!("no contact sensor named '{name}'"),
                })?;
            output::render_single(
                &global.output,
                sensor,
                |s| format!("{}: {}", s.name, output::sensor_label(s.is_open, color)),
                |s| output::sensor_label(s.is_open, false),
            )?
        }
        None => output::render_single(
            &global.output,
            &state,
            |s| output::state_detail(s, color),
            |s| s.arming_state.to_string(),
        )?,
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
