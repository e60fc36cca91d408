//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use adt_core::{ArmingState, SystemState};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Arming state label, red when armed, green when disarmed.
pub fn arming_label(state: ArmingState, color: bool) -> String {
    let label = state.to_string();
    match (color, state.is_armed()) {
        (false, _) => label,
        (true, true) => label.red().bold().to_string(),
        (true, false) => label.green().to_string(),
    }
}

fn flag(value: bool, color: bool) -> String {
    match (color, value) {
        (false, true) => "yes".into(),
        (false, false) => "no".into(),
        (true, true) => "yes".yellow().bold().to_string(),
        (true, false) => "no".dimmed().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`; plain uses `id_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Panel state ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Key/value summary followed by a sensor table.
pub fn state_detail(state: &SystemState, color: bool) -> String {
    let mut lines = vec![
        format!("Arming:       {}", arming_label(state.arming_state, color)),
        format!("Target:       {}", arming_label(state.target_state, color)),
        format!("Not ready:    {}", flag(state.fault_status, color)),
        format!("Battery:      {}%", state.battery_level),
        format!("Low battery:  {}", flag(state.low_battery_status, color)),
    ];

    if !state.contact_sensors.is_empty() {
        let rows: Vec<SensorRow> = state
            .contact_sensors
            .iter()
            .map(|sensor| SensorRow {
                name: sensor.name.clone(),
                state: sensor_label(sensor.is_open, color),
            })
            .collect();
        lines.push(String::new());
        lines.push(Table::new(rows).with(Style::rounded()).to_string());
    }

    lines.join("\n")
}

pub fn sensor_label(is_open: bool, color: bool) -> String {
    match (color, is_open) {
        (false, true) => "open".into(),
        (false, false) => "closed".into(),
        (true, true) => "open".yellow().to_string(),
        (true, false) => "closed".green().to_string(),
    }
}

/// One line per update for `watch`.
pub fn state_line(state: &SystemState, color: bool) -> String {
    let mut line = format!(
        "{}  {}",
        chrono::Local::now().format("%H:%M:%S"),
        arming_label(state.arming_state, color)
    );
    if state.target_state != state.arming_state {
        line.push_str(&format!(" -> {}", arming_label(state.target_state, color)));
    }
    if state.fault_status {
        line.push_str("  not ready");
    }
    if state.low_battery_status {
        line.push_str("  low battery");
    }
    if state.any_open() {
        let open: Vec<&str> = state
            .contact_sensors
            .iter()
            .filter(|sensor| sensor.is_open)
            .map(|sensor| sensor.name.as_str())
            .collect();
        line.push_str(&format!("  open: {}", open.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use adt_core::ContactSensor;

    use super::*;

    fn state() -> SystemState {
        SystemState {
            arming_state: ArmingState::Disarmed,
            fault_status: true,
            battery_level: 10,
            low_battery_status: true,
            target_state: ArmingState::Disarmed,
            contact_sensors: vec![ContactSensor {
                name: "Ventana cocina".into(),
                is_open: true,
            }],
        }
    }

    #[test]
    fn detail_lists_fields_and_sensors() {
        let text = state_detail(&state(), false);
        assert!(text.contains("Arming:       DISARMED"));
        assert!(text.contains("Battery:      10%"));
        assert!(text.contains("Ventana cocina"));
        assert!(text.contains("open"));
    }

    #[test]
    fn watch_line_flags_faults_and_open_sensors() {
        let line = state_line(&state(), false);
        assert!(line.contains("DISARMED"));
        assert!(line.contains("not ready"));
        assert!(line.contains("low battery"));
        assert!(line.ends_with("open: Ventana cocina"));
    }

    #[test]
    fn plain_output_uses_id_fn() {
        let out = render_single(
            &OutputFormat::Plain,
            &state(),
            |_| String::new(),
            |s| s.arming_state.to_string(),
        )
        .unwrap_or_default();
        assert_eq!(out, "DISARMED");
    }
}
