// ── Panel state ──
//
// Canonical, value-typed view of the alarm panel. Numeric codes follow
// the HomeKit SecuritySystem characteristic so bridge adapters can pass
// them straight through.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Arming state as reported by (or requested from) the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ArmingState {
    Home,
    Away,
    Disarmed,
    DisarmedNotReady,
}

impl ArmingState {
    /// HomeKit `SecuritySystemCurrentState` code.
    pub fn code(self) -> u8 {
        match self {
            Self::Home => 0,
            Self::Away => 1,
            Self::Disarmed => 3,
            Self::DisarmedNotReady => 4,
        }
    }

    pub fn is_armed(self) -> bool {
        matches!(self, Self::Home | Self::Away)
    }
}

impl TryFrom<u8> for ArmingState {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Home),
            1 => Ok(Self::Away),
            3 => Ok(Self::Disarmed),
            4 => Ok(Self::DisarmedNotReady),
            _ => Err(CoreError::UnsupportedMode { code }),
        }
    }
}

/// A mode a caller may request. `DisarmedNotReady` is an observation,
/// never a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ArmingMode {
    Home,
    Away,
    Disarmed,
}

impl ArmingMode {
    /// HomeKit `SecuritySystemTargetState` code.
    pub fn code(self) -> u8 {
        ArmingState::from(self).code()
    }
}

impl TryFrom<u8> for ArmingMode {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Home),
            1 => Ok(Self::Away),
            3 => Ok(Self::Disarmed),
            _ => Err(CoreError::UnsupportedMode { code }),
        }
    }
}

impl From<ArmingMode> for ArmingState {
    fn from(mode: ArmingMode) -> Self {
        match mode {
            ArmingMode::Home => Self::Home,
            ArmingMode::Away => Self::Away,
            ArmingMode::Disarmed => Self::Disarmed,
        }
    }
}

/// A door/window sensor. The name is the only identity the portal exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSensor {
    pub name: String,
    pub is_open: bool,
}

/// One complete scrape of the dashboard, replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemState {
    pub arming_state: ArmingState,
    /// Set only while the panel reports "not ready".
    pub fault_status: bool,
    /// Battery tier as a percentage: 10, 50 or 100.
    pub battery_level: u8,
    pub low_battery_status: bool,
    /// The requested mode while a command is pending, else `arming_state`.
    pub target_state: ArmingState,
    pub contact_sensors: Vec<ContactSensor>,
}

impl SystemState {
    /// Look up a contact sensor by name.
    pub fn contact_sensor(&self, name: &str) -> Option<&ContactSensor> {
        self.contact_sensors.iter().find(|sensor| sensor.name == name)
    }

    /// Whether any door or window is open.
    pub fn any_open(&self) -> bool {
        self.contact_sensors.iter().any(|sensor| sensor.is_open)
    }

    /// Whether the panel accepts a request for `mode` in this state.
    pub fn accepts(&self, mode: ArmingMode) -> bool {
        !self.fault_status || mode == ArmingMode::Disarmed
    }

    pub(crate) fn with_target(mut self, target: Option<ArmingState>) -> Self {
        self.target_state = target.unwrap_or(self.arming_state);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state(fault_status: bool) -> SystemState {
        SystemState {
            arming_state: ArmingState::Disarmed,
            fault_status,
            battery_level: 100,
            low_battery_status: false,
            target_state: ArmingState::Disarmed,
            contact_sensors: vec![
                ContactSensor {
                    name: "Puerta".into(),
                    is_open: false,
                },
                ContactSensor {
                    name: "Ventana".into(),
                    is_open: true,
                },
            ],
        }
    }

    #[test]
    fn homekit_codes() {
        assert_eq!(ArmingState::Home.code(), 0);
        assert_eq!(ArmingState::Away.code(), 1);
        assert_eq!(ArmingState::Disarmed.code(), 3);
        assert_eq!(ArmingState::DisarmedNotReady.code(), 4);
        assert_eq!(ArmingState::try_from(4).unwrap(), ArmingState::DisarmedNotReady);
    }

    #[test]
    fn only_three_modes_can_be_requested() {
        assert_eq!(ArmingMode::try_from(1).unwrap(), ArmingMode::Away);
        assert!(matches!(
            ArmingMode::try_from(4),
            Err(CoreError::UnsupportedMode { code: 4 })
        ));
        assert!(matches!(
            ArmingMode::try_from(2),
            Err(CoreError::UnsupportedMode { code: 2 })
        ));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("away".parse::<ArmingMode>().unwrap(), ArmingMode::Away);
        assert_eq!(ArmingState::DisarmedNotReady.to_string(), "DISARMED_NOT_READY");
    }

    #[test]
    fn fault_blocks_arming_but_not_disarming() {
        let faulted = state(true);
        assert!(!faulted.accepts(ArmingMode::Away));
        assert!(!faulted.accepts(ArmingMode::Home));
        assert!(faulted.accepts(ArmingMode::Disarmed));
        assert!(state(false).accepts(ArmingMode::Away));
    }

    #[test]
    fn sensor_lookup_by_name() {
        let s = state(false);
        assert!(s.contact_sensor("Ventana").unwrap().is_open);
        assert!(s.contact_sensor("Garage").is_none());
        assert!(s.any_open());
    }

    #[test]
    fn target_overlay_defaults_to_arming_state() {
        let s = state(false).with_target(None);
        assert_eq!(s.target_state, ArmingState::Disarmed);
        let s = s.with_target(Some(ArmingState::Away));
        assert_eq!(s.target_state, ArmingState::Away);
    }
}
