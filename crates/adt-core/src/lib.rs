// adt-core: State cache, reconciliation and recovery between adt-api and consumers.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
mod reconcile;
pub mod recovery;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AdtConfig, TlsVerification};
pub use controller::AdtClient;
pub use error::CoreError;
pub use recovery::RecoveryState;
pub use store::StateCache;
pub use stream::{StateStream, StateUpdates};

pub use model::{ArmingMode, ArmingState, ContactSensor, SystemState};
