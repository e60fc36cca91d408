// ── Domain model ──

pub mod state;

pub use state::{ArmingMode, ArmingState, ContactSensor, SystemState};
