// ── Portal-to-domain conversions ──
//
// Bridges the raw `adt_api` dashboard scrape into the canonical
// `SystemState`. Action handles pass through untouched.

use adt_api::{ActionHandles, Dashboard, PanelAction, PanelStatus, SensorReading};

use crate::model::{ArmingMode, ArmingState, ContactSensor, SystemState};

impl From<SensorReading> for ContactSensor {
    fn from(reading: SensorReading) -> Self {
        Self {
            name: reading.name,
            is_open: reading.open,
        }
    }
}

impl From<ArmingMode> for PanelAction {
    fn from(mode: ArmingMode) -> Self {
        match mode {
            ArmingMode::Home => Self::Home,
            ArmingMode::Away => Self::Away,
            ArmingMode::Disarmed => Self::Disarm,
        }
    }
}

/// Split a scrape into the state it shows and the handles for the next command.
///
/// A "not ready" panel surfaces as `Disarmed` with `fault_status` set.
pub fn into_state(dashboard: Dashboard) -> (SystemState, ActionHandles) {
    let (arming_state, fault_status) = match dashboard.status {
        PanelStatus::Disarmed => (ArmingState::Disarmed, false),
        PanelStatus::Home => (ArmingState::Home, false),
        PanelStatus::Away => (ArmingState::Away, false),
        PanelStatus::NotReady => (ArmingState::Disarmed, true),
    };

    let state = SystemState {
        arming_state,
        fault_status,
        battery_level: dashboard.battery.percent(),
        low_battery_status: dashboard.battery.is_low(),
        target_state: arming_state,
        contact_sensors: dashboard
            .sensors
            .into_iter()
            .map(ContactSensor::from)
            .collect(),
    };

    (state, dashboard.handles)
}
